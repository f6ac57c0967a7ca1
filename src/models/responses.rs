//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::{CacheValue, EngineSettings, EvictionPolicy, StatsSnapshot};

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: CacheValue,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: CacheValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for the clear endpoint (POST /caches/:name/clear)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Success message
    pub message: String,
    /// The cache that was cleared
    pub cache: String,
}

impl ClearResponse {
    pub fn new(cache: impl Into<String>) -> Self {
        let cache = cache.into();
        Self {
            message: format!("Cache '{}' cleared", cache),
            cache,
        }
    }
}

/// Response body for the stats endpoints
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Hits plus misses
    pub total_requests: u64,
    /// Hit rate (hits / total_requests)
    pub hit_rate: f64,
    /// Smoothed lookup latency in milliseconds
    pub avg_response_time_ms: f64,
    /// Bytes held by the fast tier
    pub cache_size_bytes: u64,
    /// Current number of entries in the fast tier
    pub total_entries: usize,
    /// Inserts that alone exceeded the byte budget
    pub oversized_inserts: u64,
    /// Active eviction policy
    pub policy: EvictionPolicy,
    /// Current default TTL in seconds
    pub default_ttl: u64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from a snapshot and the engine's settings
    pub fn new(stats: &StatsSnapshot, settings: &EngineSettings) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            total_requests: stats.total_requests,
            hit_rate: stats.hit_rate(),
            avg_response_time_ms: stats.avg_response_time.as_secs_f64() * 1000.0,
            cache_size_bytes: stats.cache_size_bytes,
            total_entries: stats.entry_count,
            oversized_inserts: stats.oversized_inserts,
            policy: settings.policy,
            default_ttl: settings.default_ttl.as_secs(),
        }
    }
}

/// Response body for GET /stats/all
pub type GlobalStatsResponse = BTreeMap<String, StatsResponse>;

/// Response body for the optimize endpoint (POST /caches/:name/optimize)
#[derive(Debug, Clone, Serialize)]
pub struct OptimizeResponse {
    /// The tuned cache
    pub cache: String,
    /// Policy after tuning
    pub policy: EvictionPolicy,
    /// Default TTL in seconds after tuning
    pub default_ttl: u64,
}

impl OptimizeResponse {
    pub fn new(cache: impl Into<String>, settings: &EngineSettings) -> Self {
        Self {
            cache: cache.into(),
            policy: settings.policy,
            default_ttl: settings.default_ttl.as_secs(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Whether a backing tier is configured and currently reachable
    pub backing_tier: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(backing_tier: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            backing_tier: backing_tier.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
