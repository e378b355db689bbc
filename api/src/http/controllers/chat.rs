use std::{convert::Infallible, time::Duration};

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use axum_jsonschema::Json;
use futures::Stream;
use schemars::JsonSchema;
use tokio_stream::StreamExt;
use tracing::error;

use crate::axum::{errors::ApiResult, state::AppState};
use docuchat::ChatMessage;

// Matches the pacing the frontend expects between SSE events.
const TOKEN_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, serde::Deserialize, JsonSchema)]
pub struct StartRequest {
    asset_id: String,
}

#[derive(Debug, serde::Serialize)]
pub struct StartResponse {
    chat_thread_id: String,
}

pub async fn start(
    State(state): State<AppState>,
    Json(StartRequest { asset_id }): Json<StartRequest>,
) -> ApiResult<Json<StartResponse>> {
    let chat_thread_id = state.registry.start_session(&asset_id).await?;

    Ok(Json(StartResponse { chat_thread_id }))
}

#[derive(Debug, serde::Deserialize, JsonSchema)]
pub struct MessageRequest {
    chat_thread_id: String,
    message: String,
}

pub async fn message(
    State(state): State<AppState>,
    Json(MessageRequest {
        chat_thread_id,
        message,
    }): Json<MessageRequest>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let stream = state.registry.send_message(&chat_thread_id, &message).await?;

    let stream = stream
        .map(|token| match token {
            Ok(token) => Ok::<_, Infallible>(Event::default().data(token)),
            Err(err) => {
                error!("chat exchange failed: {err}");

                Ok(Event::default().id("error").data(err.to_string()))
            }
        })
        .throttle(TOKEN_INTERVAL);

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[derive(Debug, serde::Deserialize)]
pub struct ThreadQuery {
    chat_thread_id: String,
}

#[derive(Debug, serde::Serialize)]
pub struct HistoryResponse {
    messages: Vec<ChatMessage>,
}

pub async fn history(
    State(state): State<AppState>,
    Query(ThreadQuery { chat_thread_id }): Query<ThreadQuery>,
) -> ApiResult<Json<HistoryResponse>> {
    let messages = state.registry.history(&chat_thread_id).await?;

    Ok(Json(HistoryResponse { messages }))
}

#[derive(Debug, serde::Serialize)]
pub struct StatusResponse {
    is_processing: bool,
}

pub async fn status(
    State(state): State<AppState>,
    Query(ThreadQuery { chat_thread_id }): Query<ThreadQuery>,
) -> ApiResult<Json<StatusResponse>> {
    let is_processing = state.registry.status(&chat_thread_id).await?;

    Ok(Json(StatusResponse { is_processing }))
}
