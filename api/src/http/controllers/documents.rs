use axum::extract::{Multipart, State};
use axum_jsonschema::Json;
use tracing::info;

use crate::axum::{
    errors::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, serde::Serialize)]
pub struct ProcessResponse {
    asset_id: String,
}

pub async fn process(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<ProcessResponse>> {
    let field = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::ClientError("Invalid multipart body.".to_string()))?
        .ok_or_else(|| ApiError::ClientError("Missing file upload.".to_string()))?;

    let filename = field
        .file_name()
        .ok_or_else(|| ApiError::ClientError("Missing file name.".to_string()))?
        .to_string();

    let bytes = field
        .bytes()
        .await
        .map_err(|_| ApiError::ClientError("Failed to read file upload.".to_string()))?;

    info!("processing upload {filename} ({} bytes)", bytes.len());

    let asset_id = state.processor.process(bytes.to_vec(), &filename).await?;

    Ok(Json(ProcessResponse { asset_id }))
}
