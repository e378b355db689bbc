use axum::{routing::get, Json, Router};
use std::env;

mod chat;
mod documents;

use crate::axum::state::AppState;

pub fn mount() -> Router<AppState> {
    Router::new()
        .nest(
            "/api",
            Router::new().merge(documents::mount()).merge(chat::mount()),
        )
        .route("/version", get(version))
}

#[derive(serde::Serialize)]
struct ApiVersion {
    semver: String,
    rev: Option<String>,
}

#[allow(clippy::unused_async)]
async fn version() -> Json<ApiVersion> {
    Json(ApiVersion {
        rev: env::var("GIT_REV").ok(),
        semver: env!("CARGO_PKG_VERSION").to_string(),
    })
}
