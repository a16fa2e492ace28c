//! Error types for the multi-tier cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache tiers, codecs and the HTTP surface.
///
/// A miss in the local tier is never an error; `NotFound` only surfaces once
/// the remote store has been consulted as well.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key absent in the store consulted
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Transport or protocol failure reported by the remote store
    #[error("Remote store error: {0}")]
    Store(String),

    /// Value could not be encoded into bytes
    #[error("Encode error: {0}")]
    Encode(String),

    /// Bytes could not be decoded into a value
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid construction parameters
    #[error("Configuration error: {0}")]
    Config(String),

    /// The operation's context was cancelled before the remote call finished
    #[error("Operation cancelled")]
    Cancelled,

    /// The operation's context deadline elapsed before the remote call finished
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CacheError {
    /// Returns true for a plain "not found" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::Encode(_) | CacheError::Decode(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::Store(_) => StatusCode::BAD_GATEWAY,
            CacheError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            CacheError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        let cases = vec![
            (CacheError::NotFound("k".into()), StatusCode::NOT_FOUND),
            (CacheError::InvalidRequest("bad".into()), StatusCode::BAD_REQUEST),
            (CacheError::Decode("utf8".into()), StatusCode::BAD_REQUEST),
            (CacheError::Store("down".into()), StatusCode::BAD_GATEWAY),
            (CacheError::DeadlineExceeded, StatusCode::GATEWAY_TIMEOUT),
            (CacheError::Cancelled, StatusCode::SERVICE_UNAVAILABLE),
            (CacheError::Config("cap".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_is_not_found() {
        assert!(CacheError::NotFound("k".into()).is_not_found());
        assert!(!CacheError::Store("k".into()).is_not_found());
    }
}
