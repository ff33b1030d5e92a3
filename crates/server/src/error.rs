//! HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracedb_core::{Error, ErrorKind};
use tracing::{error, warn};

/// Body of every non-2xx response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable, generic message
    pub error: String,
    /// What exactly was wrong with the request, for client errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Error returned by handlers
#[derive(Debug)]
pub enum AppError {
    /// Malformed input; nothing was written
    BadRequest(String),
    /// Entity absent; carries the response message
    NotFound(&'static str),
    /// Storage or runtime failure; details are logged, not returned
    Internal(String),
}

impl AppError {
    /// Map a core error, using `not_found` as the message for absent entities
    pub fn with_not_found(e: Error, not_found: &'static str) -> Self {
        match e.kind() {
            ErrorKind::NotFound => AppError::NotFound(not_found),
            _ => AppError::from(e),
        }
    }
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        match e.kind() {
            ErrorKind::Client => AppError::BadRequest(e.to_string()),
            ErrorKind::NotFound => AppError::NotFound("Not found"),
            ErrorKind::Server => AppError::Internal(e.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("blocking task failed: {e}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(detail) => {
                warn!(%detail, "Rejected request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Invalid payload format".to_string(),
                        detail: Some(detail),
                    },
                )
            }
            AppError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: message.to_string(),
                    detail: None,
                },
            ),
            AppError::Internal(cause) => {
                error!(%cause, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal server error".to_string(),
                        detail: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
