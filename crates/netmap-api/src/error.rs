//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use netmap_processor::ProcessorError;
use netmap_storage::StorageError;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced through the HTTP API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The requested artifact does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request body or path was malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The publish collides with an already registered identity.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Backend failure; details stay in the log.
    #[error("internal error")]
    Internal(String),
}

/// A specialized Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

impl From<ProcessorError> for ApiError {
    fn from(err: ProcessorError) -> Self {
        match &err {
            ProcessorError::NameConflict { .. } => ApiError::Conflict(err.to_string()),
            ProcessorError::Invalid(_) => ApiError::BadRequest(err.to_string()),
            ProcessorError::Storage(StorageError::NotFound(key)) => ApiError::NotFound(key.clone()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => ApiError::NotFound(key),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
