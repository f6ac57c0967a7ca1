//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::time::Duration;

use serde::Deserialize;

use crate::cache::{CacheValue, WriteTier};

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value
/// - `ttl`: Optional TTL in seconds (uses default if not specified)
/// - `write_through`: Optional override of the cache's write tier
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: CacheValue,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<i64>,
    /// Mirror to the backing tier (true) or keep local (false)
    #[serde(default)]
    pub write_through: Option<bool>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        match self.ttl {
            Some(ttl) if ttl < 0 => Some("TTL cannot be negative".to_string()),
            Some(0) => Some("TTL must be greater than zero".to_string()),
            _ => None,
        }
    }

    /// TTL as a duration; call after `validate`.
    pub fn ttl_duration(&self) -> Option<Duration> {
        self.ttl.map(|secs| Duration::from_secs(secs.max(0) as u64))
    }

    /// Requested write tier, if the caller chose one.
    pub fn write_tier(&self) -> Option<WriteTier> {
        self.write_through.map(|through| {
            if through {
                WriteTier::WriteThrough
            } else {
                WriteTier::FastOnly
            }
        })
    }
}
