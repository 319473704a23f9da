// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::{
    progress::{RetryError, StoreError, TransactionError},
    quiz::InvalidTransition,
};

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden (backend rules or ownership)
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., duplicate username)
    Conflict(String),

    // 503 Service Unavailable (transient storage failure after retries)
    ServiceUnavailable(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Storage failures become user-facing messages; raw details stay in the log.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        tracing::warn!("Storage error: {}", err);
        match err {
            StoreError::Transient(_) => AppError::ServiceUnavailable(
                "The service is temporarily unavailable. Please try again.".to_string(),
            ),
            StoreError::PermissionDenied(_) => AppError::Forbidden(
                "You are not allowed to perform this action.".to_string(),
            ),
            StoreError::NotFound(_) => AppError::NotFound("Content unavailable".to_string()),
            StoreError::Conflict(_) => AppError::Conflict(
                "The data changed while saving. Please try again.".to_string(),
            ),
            StoreError::Other(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<RetryError<StoreError>> for AppError {
    fn from(err: RetryError<StoreError>) -> Self {
        match err {
            RetryError::Exhausted { attempts, last } => {
                tracing::error!("Write abandoned after {} attempts: {}", attempts, last);
                AppError::ServiceUnavailable(
                    "Could not save your answer. Please check your connection and submit again."
                        .to_string(),
                )
            }
            RetryError::Aborted(e) => AppError::from(e),
        }
    }
}

impl From<TransactionError> for AppError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::NotFound(_) => AppError::NotFound("User not found".to_string()),
            TransactionError::Contended { .. } => AppError::Conflict(
                "Your progress is being updated elsewhere. Please try again.".to_string(),
            ),
            TransactionError::Store(e) => AppError::from(e),
        }
    }
}

impl From<InvalidTransition> for AppError {
    fn from(err: InvalidTransition) -> Self {
        AppError::Conflict(format!("Cannot {} right now", err.action))
    }
}
