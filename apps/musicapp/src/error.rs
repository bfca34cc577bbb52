//! Application error types for the music library.
//!
//! Provides a unified error type that implements `IntoResponse` for Axum.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::db::DbError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Database setup errors
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// SQLite query errors
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Configuration loading/parsing errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Blob storage I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Album, song, user or blob not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authentication required
    #[error("Unauthorized")]
    Unauthorized,

    /// Invalid request data
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unique constraint hit (duplicate song name within an album)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Sqlite(e) => {
                tracing::error!("SQLite error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", None)
            }
            AppError::Io(e) => {
                tracing::error!("I/O error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", None)
            }
            AppError::NotFound(resource) => {
                (StatusCode::NOT_FOUND, "not_found", Some(resource.clone()))
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
