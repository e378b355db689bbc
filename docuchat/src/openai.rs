use std::{sync::Arc, time::Duration};

use anyhow::anyhow;
use async_openai::{
    types::{CreateCompletionRequestArgs, CreateEmbeddingRequestArgs},
    Client,
};
use backoff::ExponentialBackoffBuilder;
use futures::future;
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    qdrant::{ChunkPayload, PointStruct},
    splitter::Chunk,
};

const EMBEDDING_MODEL: &str = "text-embedding-ada-002";
const COMPLETION_MODEL: &str = "text-davinci-003";

#[derive(Clone)]
pub struct OpenAI {
    client: Arc<Client>,
}

impl OpenAI {
    #[must_use]
    pub fn new() -> Self {
        let backoff = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::from_secs(60)))
            .build();

        Self {
            client: Arc::new(Client::new().with_backoff(backoff)),
        }
    }

    /// Embeds every chunk of a document, one request per chunk.
    ///
    /// # Errors
    ///
    /// Fails if the Embeddings API returns an error for any chunk.
    pub async fn embed_chunks(&self, source: &str, chunks: &[Chunk]) -> Result<Vec<PointStruct>> {
        let mut handles = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            let client = self.client.clone();
            let request = CreateEmbeddingRequestArgs::default()
                .model(EMBEDDING_MODEL)
                .input(chunk.text.clone())
                .build()?;

            handles.push(tokio::spawn(async move {
                client.embeddings().create(request).await
            }));
        }

        let responses = future::join_all(handles).await;
        let mut points = Vec::with_capacity(chunks.len());

        for (chunk, response) in chunks.iter().zip(responses) {
            let response = response.map_err(|e| Error::Processing(e.into()))??;

            points.push(PointStruct {
                id: Uuid::new_v4().to_string(),
                vector: response
                    .data
                    .first()
                    .ok_or_else(|| Error::Processing(anyhow!("missing embedding in response")))?
                    .embedding
                    .clone(),
                payload: ChunkPayload {
                    text: chunk.text.clone(),
                    source: source.to_string(),
                    chunk_index: chunk.index,
                },
            });
        }

        Ok(points)
    }

    /// Embeds a single query string.
    ///
    /// # Errors
    ///
    /// Fails if the Embeddings API returns an error.
    pub async fn raw_embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(EMBEDDING_MODEL)
            .input(text)
            .build()?;

        let response = self.client.embeddings().create(request).await?;

        Ok(response
            .data
            .first()
            .ok_or_else(|| Error::Processing(anyhow!("missing embedding in response")))?
            .embedding
            .clone())
    }

    /// Generates an answer for the given prompt.
    ///
    /// # Errors
    ///
    /// Fails if the Completions API returns an error or an empty choice list.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let request = CreateCompletionRequestArgs::default()
            .model(COMPLETION_MODEL)
            .temperature(0.7)
            .max_tokens(700_u16)
            .prompt(prompt)
            .build()?;

        let response = self.client.completions().create(request).await?;

        Ok(response
            .choices
            .first()
            .ok_or_else(|| Error::Processing(anyhow!("no completion returned")))?
            .text
            .trim()
            .to_string())
    }
}

impl Default for OpenAI {
    fn default() -> Self {
        Self::new()
    }
}
