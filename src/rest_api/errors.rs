//! # REST API Errors
//!
//! Error types for the REST API module.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use super::accessor::AccessError;
use super::parser::ClauseError;

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

/// REST API errors
#[derive(Debug, Clone, Error)]
pub enum RestError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Malformed filter clause (strict mode only)
    #[error("Invalid filter: {0}")]
    InvalidFilter(#[from] ClauseError),

    /// Invalid request body
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Record not found
    #[error("Not found")]
    NotFound,

    /// Table not registered
    #[error("Table {0} not found")]
    TableNotFound(String),

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Any failure raised by the data accessor
    #[error("{0}")]
    Internal(String),
}

impl RestError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            RestError::InvalidFilter(_) => StatusCode::BAD_REQUEST,
            RestError::InvalidBody(_) => StatusCode::BAD_REQUEST,

            // 404 Not Found
            RestError::NotFound => StatusCode::NOT_FOUND,
            RestError::TableNotFound(_) => StatusCode::NOT_FOUND,

            // 500 Internal Server Error
            RestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AccessError> for RestError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::RecordNotFound => RestError::NotFound,
            AccessError::InvalidRecord(msg) => RestError::InvalidBody(msg),
            other => RestError::Internal(other.to_string()),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<RestError> for ErrorResponse {
    fn from(err: RestError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }
        let body = Json(ErrorResponse::from(self));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            RestError::TableNotFound("x".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(RestError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            RestError::Internal("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            RestError::InvalidBody("nope".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            RestError::TableNotFound("unknown_table".to_string()).to_string(),
            "Table unknown_table not found"
        );
        assert_eq!(RestError::NotFound.to_string(), "Not found");
        assert_eq!(
            RestError::Internal("connection reset".to_string()).to_string(),
            "connection reset"
        );
    }

    #[test]
    fn test_access_error_mapping() {
        assert!(matches!(
            RestError::from(AccessError::RecordNotFound),
            RestError::NotFound
        ));
        assert!(matches!(
            RestError::from(AccessError::Conflict("id 1".to_string())),
            RestError::Internal(_)
        ));
        assert!(matches!(
            RestError::from(AccessError::InvalidRecord("not an object".to_string())),
            RestError::InvalidBody(_)
        ));
    }
}
