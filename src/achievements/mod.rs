pub mod repo;
pub mod services;

use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use crate::{
    auth::AuthUser,
    error::{internal, ApiError},
    state::AppState,
};
use repo::Achievement;

pub fn router() -> Router<AppState> {
    Router::new().route("/achievements", get(list_achievements))
}

#[instrument(skip(state))]
async fn list_achievements(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Achievement>>, ApiError> {
    let items = repo::list_by_user(&state.db, user.id)
        .await
        .map_err(internal)?;
    Ok(Json(items))
}
