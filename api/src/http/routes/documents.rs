use axum::{extract::DefaultBodyLimit, routing::post, Router};

use crate::{axum::state::AppState, http::controllers::DocumentsController};

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub fn mount() -> Router<AppState> {
    Router::new().nest(
        "/documents",
        Router::new()
            .route("/process", post(DocumentsController::process))
            .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
    )
}
