//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::backing::BackingConfig;
use crate::cache::{AdaptiveWeights, EngineConfig, EvictionPolicy, TuningConfig, WriteTier};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Fast-tier byte budget of each cache
    pub max_memory_bytes: u64,
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: u64,
    /// Initial eviction policy
    pub eviction_policy: EvictionPolicy,
    /// Ceiling in seconds for the self-tuned default TTL
    pub max_ttl: u64,
    /// Average lookup latency that triggers TTL growth
    pub latency_threshold_ms: u64,
    /// Hit rate under which the policy switches to adaptive
    pub hit_rate_threshold: f64,
    /// Base URL of the shared key-value service, if any
    pub backing_url: Option<String>,
    /// Namespace prefix for backing-tier keys
    pub backing_prefix: String,
    /// Per-call backing-tier timeout in milliseconds
    pub backing_timeout_ms: u64,
    /// Seconds the backing tier stays disabled after a failure
    pub backing_cooldown_secs: u64,
    /// Mirror plain sets to the backing tier
    pub backing_write_through: bool,
    /// HTTP server port
    pub server_port: u16,
    /// Expired-entry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Self-tuning interval in seconds
    pub optimize_interval: u64,
}

/// Reads and parses a variable, falling back on absence or parse failure.
fn var_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_MEMORY_BYTES` - Fast-tier budget per cache (default: 100000000)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `EVICTION_POLICY` - lru, lfu, age or adaptive (default: adaptive)
    /// - `MAX_TTL` - Self-tuning TTL ceiling in seconds (default: 3600)
    /// - `LATENCY_THRESHOLD_MS` - Tuning latency trigger (default: 10)
    /// - `HIT_RATE_THRESHOLD` - Tuning hit-rate trigger (default: 0.7)
    /// - `BACKING_URL` - Shared key-value service (default: unset)
    /// - `BACKING_PREFIX` - Backing key prefix (default: tiered:cache:)
    /// - `BACKING_TIMEOUT_MS` - Backing call timeout (default: 250)
    /// - `BACKING_COOLDOWN_SECS` - Disabled window after failure (default: 300)
    /// - `BACKING_WRITE_THROUGH` - Mirror sets to backing (default: true)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Expiry sweep frequency in seconds (default: 1)
    /// - `OPTIMIZE_INTERVAL` - Self-tuning frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_memory_bytes: var_or("MAX_MEMORY_BYTES", defaults.max_memory_bytes),
            default_ttl: var_or("DEFAULT_TTL", defaults.default_ttl),
            eviction_policy: var_or("EVICTION_POLICY", defaults.eviction_policy),
            max_ttl: var_or("MAX_TTL", defaults.max_ttl),
            latency_threshold_ms: var_or("LATENCY_THRESHOLD_MS", defaults.latency_threshold_ms),
            hit_rate_threshold: var_or("HIT_RATE_THRESHOLD", defaults.hit_rate_threshold),
            backing_url: env::var("BACKING_URL")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            backing_prefix: env::var("BACKING_PREFIX").unwrap_or(defaults.backing_prefix),
            backing_timeout_ms: var_or("BACKING_TIMEOUT_MS", defaults.backing_timeout_ms),
            backing_cooldown_secs: var_or("BACKING_COOLDOWN_SECS", defaults.backing_cooldown_secs),
            backing_write_through: var_or("BACKING_WRITE_THROUGH", defaults.backing_write_through),
            server_port: var_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: var_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            optimize_interval: var_or("OPTIMIZE_INTERVAL", defaults.optimize_interval),
        }
    }

    /// Per-engine settings derived from this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_memory_bytes: self.max_memory_bytes,
            default_ttl: Duration::from_secs(self.default_ttl.max(1)),
            policy: self.eviction_policy,
            tuning: TuningConfig {
                hit_rate_threshold: self.hit_rate_threshold,
                latency_threshold: Duration::from_millis(self.latency_threshold_ms),
                max_ttl: Duration::from_secs(self.max_ttl),
                ..TuningConfig::default()
            },
            write_tier: if self.backing_write_through {
                WriteTier::WriteThrough
            } else {
                WriteTier::FastOnly
            },
            weights: AdaptiveWeights::default(),
        }
    }

    /// Connector settings derived from this configuration.
    pub fn backing_config(&self) -> BackingConfig {
        BackingConfig {
            key_prefix: self.backing_prefix.clone(),
            timeout: Duration::from_millis(self.backing_timeout_ms),
            cooldown: Duration::from_secs(self.backing_cooldown_secs),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_memory_bytes: 100_000_000,
            default_ttl: 300,
            eviction_policy: EvictionPolicy::Adaptive,
            max_ttl: 3600,
            latency_threshold_ms: 10,
            hit_rate_threshold: 0.7,
            backing_url: None,
            backing_prefix: "tiered:cache:".to_string(),
            backing_timeout_ms: 250,
            backing_cooldown_secs: 300,
            backing_write_through: true,
            server_port: 3000,
            cleanup_interval: 1,
            optimize_interval: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_memory_bytes, 100_000_000);
        assert_eq!(config.default_ttl, 300);
        assert_eq!(config.eviction_policy, EvictionPolicy::Adaptive);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 1);
        assert!(config.backing_url.is_none());
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the environment to avoid races between tests
        for name in [
            "MAX_MEMORY_BYTES",
            "DEFAULT_TTL",
            "EVICTION_POLICY",
            "BACKING_URL",
            "BACKING_TIMEOUT_MS",
            "SERVER_PORT",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.max_memory_bytes, 100_000_000);
        assert_eq!(config.eviction_policy, EvictionPolicy::Adaptive);
        assert!(config.backing_url.is_none());

        env::set_var("EVICTION_POLICY", "LFU");
        env::set_var("MAX_MEMORY_BYTES", "4096");
        env::set_var("BACKING_TIMEOUT_MS", "not-a-number");
        env::set_var("BACKING_URL", "http://peer:3000");

        let config = Config::from_env();
        assert_eq!(config.eviction_policy, EvictionPolicy::Lfu);
        assert_eq!(config.max_memory_bytes, 4096);
        assert_eq!(config.backing_timeout_ms, 250);
        assert_eq!(config.backing_url.as_deref(), Some("http://peer:3000"));

        for name in ["EVICTION_POLICY", "MAX_MEMORY_BYTES", "BACKING_TIMEOUT_MS", "BACKING_URL"] {
            env::remove_var(name);
        }
    }

    #[test]
    fn test_engine_config_conversion() {
        let config = Config {
            default_ttl: 120,
            latency_threshold_ms: 25,
            backing_write_through: false,
            ..Config::default()
        };

        let engine = config.engine_config();
        assert_eq!(engine.default_ttl, Duration::from_secs(120));
        assert_eq!(engine.tuning.latency_threshold, Duration::from_millis(25));
        assert_eq!(engine.tuning.ttl_growth, 1.2);
        assert_eq!(engine.write_tier, WriteTier::FastOnly);

        let backing = config.backing_config();
        assert_eq!(backing.key_prefix, "tiered:cache:");
        assert_eq!(backing.cooldown, Duration::from_secs(300));
    }
}
