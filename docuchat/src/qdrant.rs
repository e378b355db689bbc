use std::env;

use anyhow::anyhow;
use futures::future::try_join_all;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

const EMBEDDING_SIZE: i32 = 1536;

#[derive(Clone)]
pub struct Qdrant {
    client: Client,
    base_url: String,
}

impl Qdrant {
    /// # Panics
    ///
    /// Panics if `$QDRANT_URL` is not set.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(env::var("QDRANT_URL").expect("$QDRANT_URL not set"))
    }

    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Creates a new Qdrant collection.
    ///
    /// # Errors
    ///
    /// Fails if the Qdrant API returns an error.
    pub async fn create_collection(&self, name: &str) -> Result<()> {
        self.client
            .put(format!("{}/collections/{name}", self.base_url))
            .json(&serde_json::json!({
                "name": name,
                "vectors": {
                    "distance": "Cosine",
                    "size": EMBEDDING_SIZE,
                }
            }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    /// Deletes a collection and every point in it.
    ///
    /// # Errors
    ///
    /// Fails if the Qdrant API returns an error.
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        self.client
            .delete(format!("{}/collections/{name}", self.base_url))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    /// Checks whether a collection exists.
    ///
    /// # Errors
    ///
    /// Fails if Qdrant answers with anything other than success or 404.
    pub async fn collection_exists(&self, name: &str) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/collections/{name}", self.base_url))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(Error::Processing(anyhow!(
                "qdrant returned {status} for collection {name}"
            ))),
        }
    }

    #[must_use]
    pub fn collection(&self, name: &str) -> Collection {
        Collection::new(
            self.client.clone(),
            format!("{}/collections/{name}", self.base_url),
        )
    }
}

impl Default for Qdrant {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct ChunkPayload {
    pub text: String,
    pub source: String,
    pub chunk_index: usize,
}

#[derive(Debug, serde::Serialize)]
pub struct PointStruct {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct PointResult {
    pub id: String,
    pub score: f32,
    pub payload: ChunkPayload,
}

pub struct Collection {
    client: Client,
    base_url: String,
}

impl Collection {
    pub const fn new(client: Client, url: String) -> Self {
        Self {
            client,
            base_url: url,
        }
    }

    /// Upserts points in batches of 30.
    ///
    /// # Errors
    ///
    /// Fails if any batch is rejected by the Qdrant API.
    pub async fn upsert(&self, points: &[PointStruct]) -> Result<()> {
        try_join_all(points.chunks(30).map(|batch| async move {
            self.client
                .put(format!("{}/points?wait=true", self.base_url))
                .json(&serde_json::json!({ "points": batch }))
                .send()
                .await?
                .error_for_status()?;

            Ok::<_, reqwest::Error>(())
        }))
        .await?;

        debug!("upserted {} vectors", points.len());

        Ok(())
    }

    /// Runs a similarity search against the collection.
    ///
    /// # Errors
    ///
    /// Fails if the Qdrant API returns an error or a malformed response.
    pub async fn query(&self, vector: Vec<f32>, limit: usize) -> Result<Vec<PointResult>> {
        let results: Value = self
            .client
            .post(format!("{}/points/search", self.base_url))
            .json(&serde_json::json!({
                "limit": limit,
                "vector": vector,
                "with_payload": true,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        results
            .get("result")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::Processing(anyhow!("no result field in search response")))?
            .iter()
            .map(|r| serde_json::from_value(r.clone()).map_err(Into::into))
            .collect()
    }
}
