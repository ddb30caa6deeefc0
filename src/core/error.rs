//! Typed error handling for resource services
//!
//! Services reject with a [`ServiceError`], whose kind is stable and maps to
//! one HTTP status at the boundary:
//!
//! - [`ServiceError::BadRequest`]: the record was rejected by validation
//! - [`ServiceError::NotFound`]: no record with that identity
//! - [`ServiceError::Unauthorized`]: login or token refresh failed
//! - [`ServiceError::Storage`] / [`ServiceError::Internal`]: anything else,
//!   passed through unchanged
//!
//! ```rust,ignore
//! match accounts.get_by_id(&id).await {
//!     Ok(account) => println!("Found: {:?}", account),
//!     Err(ServiceError::NotFound { .. }) => println!("no such account"),
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Message shared by every authentication failure, whatever the cause
pub const UNAUTHORIZED_MESSAGE: &str = "invalid username or password";

/// Error raised by a resource service operation
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Input rejected by validation (message passed through)
    #[error("{0}")]
    BadRequest(String),

    /// Lookup by identity found nothing (malformed identities included)
    #[error("{entity_type}: not found")]
    NotFound { entity_type: &'static str },

    /// Unknown account, wrong secret or unusable token
    #[error("invalid username or password")]
    Unauthorized,

    /// Storage backend failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Infrastructure failure outside storage (token signing, ...)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(entity_type: &'static str) -> Self {
        ServiceError::NotFound { entity_type }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::Storage(e) => e.status_code(),
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "BAD_REQUEST",
            ServiceError::NotFound { .. } => "NOT_FOUND",
            ServiceError::Unauthorized => "UNAUTHORIZED",
            ServiceError::Storage(e) => e.error_code(),
            ServiceError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(self.to_response())).into_response()
    }
}

/// Errors reported by a [`DocumentStore`](crate::core::store::DocumentStore)
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The record violates a storage-level rule (uniqueness, types, ...)
    #[error("{message}")]
    Validation { message: String },

    /// Connection error
    #[error("Failed to connect to {backend}: {message}")]
    Connection { backend: String, message: String },

    /// Query execution error
    #[error("{backend} query error: {message}")]
    Query { backend: String, message: String },

    /// Stored data could not be read back
    #[error("Data integrity error: {message}")]
    Integrity { message: String },
}

impl StorageError {
    pub fn validation(message: impl Into<String>) -> Self {
        StorageError::Validation {
            message: message.into(),
        }
    }

    pub fn query(backend: &str, message: impl ToString) -> Self {
        StorageError::Query {
            backend: backend.to_string(),
            message: message.to_string(),
        }
    }

    pub fn integrity(message: impl ToString) -> Self {
        StorageError::Integrity {
            message: message.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            StorageError::Validation { .. } => StatusCode::BAD_REQUEST,
            StorageError::Connection { .. } => StatusCode::SERVICE_UNAVAILABLE,
            StorageError::Query { .. } | StorageError::Integrity { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::Validation { .. } => "STORAGE_VALIDATION_ERROR",
            StorageError::Connection { .. } => "STORAGE_UNAVAILABLE",
            StorageError::Query { .. } => "STORAGE_QUERY_ERROR",
            StorageError::Integrity { .. } => "STORAGE_INTEGRITY_ERROR",
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::BadRequest(err.to_string())
    }
}

/// A specialized Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ServiceError::BadRequest("bad".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::not_found("account").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::Internal("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message_is_uniform() {
        let err = ServiceError::not_found("post");
        assert_eq!(err.to_string(), "post: not found");
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_storage_error_passes_through() {
        let err: ServiceError = StorageError::query("MongoDB", "socket closed").into();
        assert!(matches!(err, ServiceError::Storage(StorageError::Query { .. })));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "MongoDB query error: socket closed");
        assert_eq!(err.error_code(), "STORAGE_QUERY_ERROR");
    }

    #[test]
    fn test_error_response_serialization() {
        let response = ServiceError::Unauthorized.to_response();
        assert_eq!(response.code, "UNAUTHORIZED");
        assert_eq!(response.message, UNAUTHORIZED_MESSAGE);

        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
}
