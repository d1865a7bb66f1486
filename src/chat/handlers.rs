use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use time::{format_description::well_known::Iso8601, Date};
use tracing::instrument;

use super::repo::Message;
use super::services::{self, ChatTurn};
use crate::{
    auth::AuthUser,
    dates::iso_date,
    diagnostics::ErrorEntry,
    error::{bad_request, internal, ApiError, ValidationError},
    state::AppState,
    uploads::services::{read_form, MAX_UPLOAD_BYTES},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chat/messages", get(list_messages).post(send_message))
        .route(
            "/chat/photo",
            post(send_photo).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/chat/clear", post(clear_chat))
        .route("/chat/errors", get(recent_errors))
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    /// Day a reported meal is logged under; defaults to today.
    #[serde(default, with = "iso_date::option")]
    pub date: Option<Date>,
}

#[instrument(skip(state))]
pub async fn list_messages(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = services::transcript(&state, user.id, user.email.as_deref())
        .await
        .map_err(internal)?;
    Ok(Json(messages))
}

#[instrument(skip(state, body))]
pub async fn send_message(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<ChatTurn>, ApiError> {
    let text = body.content.trim();
    if text.is_empty() {
        return Err(ValidationError::Missing { field: "content" }.into());
    }
    let turn = services::send_text(&state, user.id, text, body.date)
        .await
        .map_err(internal)?;
    Ok(Json(turn))
}

/// Multipart form: `file` (image), optional `caption` and `date`.
#[instrument(skip(state, mp))]
pub async fn send_photo(
    State(state): State<AppState>,
    user: AuthUser,
    mp: Multipart,
) -> Result<Json<ChatTurn>, ApiError> {
    let mut form = read_form(mp).await.map_err(bad_request)?;
    let date = form
        .text("date")
        .map(|d| Date::parse(d, &Iso8601::DATE))
        .transpose()
        .map_err(bad_request)?;
    let caption = form.text("caption").map(str::to_string);
    let image = form
        .file
        .take()
        .ok_or(ValidationError::Missing { field: "file" })?;
    if !image.is_image() {
        return Err(bad_request("file must be an image"));
    }
    let turn = services::send_photo(&state, user.id, image, caption.as_deref(), date)
        .await
        .map_err(internal)?;
    Ok(Json(turn))
}

#[instrument(skip(state))]
pub async fn clear_chat(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Message>, ApiError> {
    let marker = services::clear(&state, user.id).await.map_err(internal)?;
    Ok(Json(marker))
}

/// The caller's recent chat failures, newest last.
#[instrument(skip(state))]
pub async fn recent_errors(State(state): State<AppState>, user: AuthUser) -> Json<Vec<ErrorEntry>> {
    Json(state.errors.for_user(user.id))
}
