use axum::Router;
use docuchat::{ChatRegistry, OpenAI, Processor, Qdrant};
use std::env;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{axum::state, http::routes};

const REQUIRED_ENV_VARS: &[&str] = &["QDRANT_URL", "OPENAI_API_KEY"];

const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEFAULT_TRANSCRIPT_DIR: &str = "./chat_history";

pub fn create() -> Router {
    for var in REQUIRED_ENV_VARS {
        assert!(env::var(var).is_ok(), "${var} not set");
    }

    let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| DEFAULT_UPLOAD_DIR.into());
    let transcript_dir =
        env::var("TRANSCRIPT_DIR").unwrap_or_else(|_| DEFAULT_TRANSCRIPT_DIR.into());

    let processor = Processor::new(OpenAI::new(), Qdrant::new(), upload_dir)
        .expect("Failed to create upload directory");
    let registry = ChatRegistry::new(OpenAI::new(), Qdrant::new(), transcript_dir)
        .expect("Failed to create transcript directory");

    Router::new()
        .merge(routes::mount())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state::create(processor, registry))
}
