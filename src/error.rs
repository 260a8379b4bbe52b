//! Error types for the audit service.
//!
//! - `AppError`: domain errors raised by services and repositories
//! - `ApiError`: wrapper that maps domain errors onto HTTP responses
//! - `Result<T>`: type alias for Results using AppError

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Domain-specific errors for audit operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid or malformed URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Request validation failed
    #[error("{0}")]
    Validation(String),

    /// Page fetch failed; the audit produces no partial report
    #[error("Failed to fetch website: {0}")]
    FetchFailed(String),

    /// Failed to parse HTML content
    #[error("HTML parsing error: {0}")]
    ParseError(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Audit not found
    #[error("Audit not found: {0}")]
    AuditNotFound(String),

    /// Website not found
    #[error("Website not found: {0}")]
    WebsiteNotFound(i64),

    /// Generic missing-record error
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Missing related record, reported with a fixed message
    #[error("{0}")]
    Missing(&'static str),

    /// Report generation requires a completed audit
    #[error("Audit must be completed to generate report")]
    AuditIncomplete,

    /// Generic error with context
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Create a fetch error
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::FetchFailed(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::DatabaseError(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidUrl(_) | Self::Validation(_) | Self::AuditIncomplete => {
                StatusCode::BAD_REQUEST
            }
            Self::AuditNotFound(_) | Self::WebsiteNotFound(_) | Self::NotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            Self::Missing(_) => StatusCode::NOT_FOUND,
            Self::FetchFailed(_) => StatusCode::BAD_GATEWAY,
            Self::ParseError(_) | Self::DatabaseError(_) | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

/// Wrapper for errors returned from API handlers.
///
/// Serializes as the JSON envelope `{"error": "..."}` with a status code
/// derived from the underlying domain error.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self(error)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        Self(AppError::Other(error))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::DatabaseError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            AppError::InvalidUrl("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::AuditNotFound("a".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Missing("Lead not found").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::fetch("refused").status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::database("locked").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn fetch_error_message_wraps_cause() {
        let err = AppError::fetch("connection refused");
        assert_eq!(
            err.to_string(),
            "Failed to fetch website: connection refused"
        );
    }
}
