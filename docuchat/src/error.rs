use async_openai::error::OpenAIError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Asset {0} not found.")]
    AssetNotFound(String),

    #[error("Chat thread {0} not found.")]
    ThreadNotFound(String),

    #[error("This chat is still processing a previous message.")]
    Busy,

    #[error("Unsupported file type: .{0}. Supported types: .txt, .pdf, .doc, .docx.")]
    UnsupportedFormat(String),

    #[error("Failed to process document: {0}")]
    Processing(anyhow::Error),

    #[error(transparent)]
    Upstream(#[from] OpenAIError),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Processing(err.into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Processing(err.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Processing(err.into())
    }
}
