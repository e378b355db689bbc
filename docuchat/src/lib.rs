#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod chain;
mod chat;
mod error;
mod loader;
mod openai;
mod processor;
mod qdrant;
mod splitter;
mod stream;

pub use chat::{ChatMessage, ChatRegistry, Role};
pub use error::{Error, Result};
pub use loader::DocumentKind;
pub use openai::OpenAI;
pub use processor::Processor;
pub use qdrant::{ChunkPayload, PointResult, Qdrant};
pub use splitter::{split, Chunk};
