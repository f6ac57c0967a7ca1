//! Backing Tier Module
//!
//! Optional slower, shared key-value tier behind the fast tier. The
//! [`BackingStore`] trait is the narrow contract with the external service;
//! [`BackingTier`] wraps it with namespacing, timeouts and a cool-down so
//! that an outage never reaches callers.

mod connector;
mod http;
mod memory;

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use connector::{BackingConfig, BackingTier};
pub use http::HttpBackingStore;
pub use memory::MemoryBackingStore;

// == Backing Error ==
/// Failure talking to the backing tier. Never surfaced past the connector.
#[derive(Error, Debug)]
pub enum BackingError {
    /// Could not reach the service
    #[error("Connection error: {0}")]
    Connection(String),

    /// The service answered with something unexpected
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The service is up but refused this particular request
    #[error("Rejected: {0}")]
    Rejected(String),

    /// The call did not finish within the configured bound
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Backing Store ==
/// Raw key-value operations on an external service.
///
/// Keys arrive already namespaced and values already serialized.
#[async_trait]
pub trait BackingStore: Send + Sync + Debug {
    /// Fetches a value, `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackingError>;

    /// Stores a value that the service should drop after `ttl_secs`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> Result<(), BackingError>;

    /// Removes a value; absent keys are not an error.
    async fn delete(&self, key: &str) -> Result<(), BackingError>;
}
