// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request (malformed request shape)
    BadRequest(String),

    // 400 Uploaded bytes are not valid UTF-8
    Decode(String),

    // 400 Model call or response parse failure
    Generation(String),

    // 400 Zero questions survived validation
    EmptyResult,

    // 400 Submitted answer count differs from the quiz's question count
    AnswerCountMismatch { expected: usize, submitted: usize },

    // 404 Not Found
    NotFound(String),

    // 409 Display-name race lost at commit time (retryable once)
    NameConflict(String),
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
            AppError::Decode(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Generation(msg) => (
                StatusCode::BAD_REQUEST,
                format!("Failed to generate quiz with AI: {}", msg),
            ),
            AppError::EmptyResult => (
                StatusCode::BAD_REQUEST,
                "AI returned no questions. Please try again or check the file content.".to_string(),
            ),
            AppError::AnswerCountMismatch { expected, submitted } => (
                StatusCode::BAD_REQUEST,
                format!(
                    "Number of answers does not match number of questions (expected {}, got {})",
                    expected, submitted
                ),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::NameConflict(msg) => (StatusCode::CONFLICT, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError`.
/// A unique-constraint violation surfaces as `NameConflict` so the upload
/// path can re-probe and retry; everything else is a 500.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::NameConflict(db.message().to_string())
            }
            _ => AppError::InternalServerError(err.to_string()),
        }
    }
}
