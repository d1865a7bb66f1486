mod classify;
mod handlers;
pub mod repo;
pub mod services;
mod texts;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
