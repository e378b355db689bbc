use axum::{
    routing::{get, post},
    Router,
};

use crate::{axum::state::AppState, http::controllers::ChatController};

pub fn mount() -> Router<AppState> {
    Router::new().nest(
        "/chat",
        Router::new()
            .route("/start", post(ChatController::start))
            .route("/message", post(ChatController::message))
            .route("/history", get(ChatController::history))
            .route("/status", get(ChatController::status)),
    )
}
