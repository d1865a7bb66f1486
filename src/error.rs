use axum::http::StatusCode;
use tracing::error;

/// Rejected user input. Surfaced to the client as 400.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
    #[error("{field} must be positive")]
    NotPositive { field: &'static str },
    #[error("{field} must not be negative")]
    Negative { field: &'static str },
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("invalid time {0:?}, expected HH:MM")]
    InvalidTime(String),
}

pub type ApiError = (StatusCode, String);

pub fn internal<E: std::fmt::Display>(e: E) -> ApiError {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
}

pub fn bad_request<E: std::fmt::Display>(e: E) -> ApiError {
    (StatusCode::BAD_REQUEST, e.to_string())
}

pub fn not_found(what: &str) -> ApiError {
    (StatusCode::NOT_FOUND, format!("{what} not found"))
}

impl From<ValidationError> for (StatusCode, String) {
    fn from(e: ValidationError) -> Self {
        bad_request(e)
    }
}
