use std::path::{Path, PathBuf};

use anyhow::anyhow;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    loader::DocumentKind,
    openai::OpenAI,
    qdrant::Qdrant,
    splitter::{self, Chunk},
};

/// Turns uploaded files into queryable vector collections. The raw upload
/// is kept on disk keyed by its asset id; the collection shares that id.
pub struct Processor {
    openai: OpenAI,
    qdrant: Qdrant,
    upload_dir: PathBuf,
}

impl Processor {
    /// # Errors
    ///
    /// Fails if the upload directory cannot be created.
    pub fn new(openai: OpenAI, qdrant: Qdrant, upload_dir: impl Into<PathBuf>) -> Result<Self> {
        let upload_dir = upload_dir.into();
        std::fs::create_dir_all(&upload_dir)?;

        Ok(Self {
            openai,
            qdrant,
            upload_dir,
        })
    }

    /// Processes an upload into an embedded collection and returns the
    /// generated asset id.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnsupportedFormat`] before any side effect for
    /// unrecognized extensions; loader and embedding failures surface as
    /// [`Error::Processing`]/[`Error::Upstream`] after the half-built
    /// collection has been deleted.
    pub async fn process(&self, bytes: Vec<u8>, filename: &str) -> Result<String> {
        let kind = DocumentKind::from_path(Path::new(filename))?;
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();

        let asset_id = Uuid::new_v4().to_string();
        let path = self.upload_dir.join(format!("{asset_id}.{ext}"));
        tokio::fs::write(&path, bytes).await?;

        let chunks = {
            let path = path.clone();

            tokio::task::spawn_blocking(move || -> Result<Vec<Chunk>> {
                let text = kind.load(&path)?;

                Ok(splitter::split(&text))
            })
            .await
            .map_err(|e| Error::Processing(e.into()))??
        };

        if chunks.is_empty() {
            return Err(Error::Processing(anyhow!(
                "document contains no extractable text"
            )));
        }

        self.qdrant.create_collection(&asset_id).await?;

        if let Err(err) = self.embed_and_store(&asset_id, filename, &chunks).await {
            // A failed ingest must not leave a partial collection around.
            let _ = self.qdrant.delete_collection(&asset_id).await;

            return Err(err);
        }

        info!(
            "processed {filename} into asset {asset_id} ({} chunks)",
            chunks.len()
        );

        Ok(asset_id)
    }

    async fn embed_and_store(&self, asset_id: &str, filename: &str, chunks: &[Chunk]) -> Result<()> {
        let points = self.openai.embed_chunks(filename, chunks).await?;

        self.qdrant.collection(asset_id).upsert(&points).await
    }
}
