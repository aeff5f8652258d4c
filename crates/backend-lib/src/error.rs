// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::validation::ValidationError;

/// Application error kinds surfaced to the orchestrating layer
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Not found: {0}")]
    NotFound(String),

    /// Deliberately carries no detail: unknown email and wrong password
    /// must be indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VAL_001",
            AppError::DuplicateEmail => "STU_001",
            AppError::NotFound(_) => "NF_001",
            AppError::InvalidCredentials => "AUTH_001",
            AppError::InvalidToken => "AUTH_002",
            AppError::StorageUnavailable(_) => "STORE_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Validation(_) => "Invalid input provided".to_string(),
            AppError::DuplicateEmail => "Email already registered".to_string(),
            AppError::NotFound(_) => "Resource not found".to_string(),
            AppError::InvalidCredentials => "Authentication failed".to_string(),
            AppError::InvalidToken => "Invalid or expired token".to_string(),
            AppError::StorageUnavailable(_) => {
                "Service temporarily unavailable, please try again later".to_string()
            },
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }

    /// Transient failures the caller may retry. Nothing is retried inside the core.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::StorageUnavailable(_))
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    pub fn storage(err: impl std::fmt::Display) -> Self {
        AppError::StorageUnavailable(err.to_string())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::StorageUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("serialization failed: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}
