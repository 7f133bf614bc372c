//! Error types for the room cache
//!
//! Provides unified error handling using thiserror.
//!
//! Only [`OriginError`] ever reaches a caller of the cache manager; store and
//! serialization failures are logged and degraded to cache misses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Store Error ==
/// Failure of a persistent key-value store operation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying filesystem error
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key cannot be represented by this store
    #[error("Invalid store key: {0}")]
    InvalidKey(String),
}

// == Cache Error ==
/// Internal cache failure. Logged by the manager, never propagated.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Persistent store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Envelope could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Origin Error ==
/// Failure of an upstream fetch.
///
/// Cloneable so every caller coalesced onto one fetch receives the same error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OriginError {
    /// Request could not be sent or the connection failed
    #[error("Origin request failed: {0}")]
    Request(String),

    /// Origin answered with a non-success status
    #[error("Origin returned status {0}")]
    Status(u16),

    /// Origin body was not valid JSON
    #[error("Origin response could not be decoded: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for OriginError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            OriginError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            OriginError::Status(status.as_u16())
        } else {
            OriginError::Request(err.to_string())
        }
    }
}

// == Api Error ==
/// Error type returned by the HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream fetch failed
    #[error(transparent)]
    Origin(#[from] OriginError),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Origin(OriginError::Status(404)) => StatusCode::NOT_FOUND,
            ApiError::Origin(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the HTTP layer.
pub type Result<T> = std::result::Result<T, ApiError>;
