//! Error types for the cache
//!
//! Only caller mistakes surface as errors; backing-tier faults are absorbed
//! inside the connector.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for cache operations and the HTTP surface.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found (or expired) in every tier
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid arguments, such as an empty key or a non-positive TTL
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
