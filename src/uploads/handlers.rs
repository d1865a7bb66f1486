use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::{info, instrument};

use super::services::{read_form, store, MAX_UPLOAD_BYTES};
use crate::{
    auth::AuthUser,
    error::{bad_request, internal, ApiError, ValidationError},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/uploads",
        post(upload_file).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
    )
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_url: String,
}

/// Multipart form with a single `file` part.
#[instrument(skip(state, mp))]
pub async fn upload_file(
    State(state): State<AppState>,
    user: AuthUser,
    mp: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let form = read_form(mp).await.map_err(bad_request)?;
    let file = form.file.ok_or(ValidationError::Missing { field: "file" })?;
    let file_url = store(&state, "uploads", user.id, file)
        .await
        .map_err(internal)?;
    info!(user_id = %user.id, %file_url, "file uploaded");
    Ok((StatusCode::CREATED, Json(UploadResponse { file_url })))
}
