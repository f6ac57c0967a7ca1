//! Backing Tier Connector
//!
//! Adapts a [`BackingStore`] for the engine: namespaces keys, serializes
//! values, bounds every call with a timeout and absorbs every failure. After
//! a connectivity failure the connector stays disabled for a cool-down; once
//! it elapses a single caller is let through as a trial call. A request the
//! service answers but refuses fails on its own and leaves the tier enabled.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{BackingError, BackingStore};
use crate::cache::CacheValue;

/// Stand-in for cool-downs too long to add to an `Instant`.
const MAX_COOLDOWN: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Peers take TTLs as signed seconds.
const MAX_TTL_SECS: u64 = i64::MAX as u64;

// == Backing Config ==
/// Connector tuning shared by every engine in a registry.
#[derive(Debug, Clone)]
pub struct BackingConfig {
    /// Prefix put in front of every key sent to the service
    pub key_prefix: String,
    /// Upper bound on each call
    pub timeout: Duration,
    /// How long to stop calling after a failure
    pub cooldown: Duration,
}

impl Default for BackingConfig {
    fn default() -> Self {
        Self {
            key_prefix: "tiered:cache:".to_string(),
            timeout: Duration::from_millis(250),
            cooldown: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Health {
    Enabled,
    Disabled { until: Instant },
    /// A trial call is in flight; one older than the timeout was abandoned
    Trialing { started: Instant },
}

/// Permission to make one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Permit {
    Normal,
    Trial,
}

// == Backing Tier ==
/// Failure-absorbing adapter in front of an optional backing store.
#[derive(Debug)]
pub struct BackingTier {
    store: Option<Arc<dyn BackingStore>>,
    prefix: String,
    timeout: Duration,
    cooldown: Duration,
    health: Mutex<Health>,
}

impl BackingTier {
    // == Constructors ==
    /// Connector over `store`, namespacing keys with `prefix`.
    pub fn new(store: Arc<dyn BackingStore>, prefix: impl Into<String>, config: &BackingConfig) -> Self {
        Self {
            store: Some(store),
            prefix: prefix.into(),
            timeout: config.timeout,
            cooldown: config.cooldown,
            health: Mutex::new(Health::Enabled),
        }
    }

    /// Connector with no store; every call is a miss or a no-op.
    pub fn none() -> Self {
        Self {
            store: None,
            prefix: String::new(),
            timeout: Duration::ZERO,
            cooldown: Duration::ZERO,
            health: Mutex::new(Health::Enabled),
        }
    }

    /// Whether a store is attached at all.
    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    /// Whether the next call would be attempted.
    pub fn is_available(&self) -> bool {
        if self.store.is_none() {
            return false;
        }
        match *self.health.lock() {
            Health::Enabled => true,
            Health::Disabled { until } => Instant::now() >= until,
            Health::Trialing { started } => started.elapsed() >= self.timeout,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Full key as sent to the service.
    pub fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn acquire(&self) -> Option<(&Arc<dyn BackingStore>, Permit)> {
        let store = self.store.as_ref()?;
        let mut health = self.health.lock();
        match *health {
            Health::Enabled => Some((store, Permit::Normal)),
            Health::Disabled { until } if Instant::now() >= until => {
                *health = Health::Trialing {
                    started: Instant::now(),
                };
                Some((store, Permit::Trial))
            }
            Health::Trialing { started } if started.elapsed() >= self.timeout => {
                *health = Health::Trialing {
                    started: Instant::now(),
                };
                Some((store, Permit::Trial))
            }
            Health::Disabled { .. } | Health::Trialing { .. } => None,
        }
    }

    fn release<T>(&self, permit: Permit, op: &str, key: &str, result: &Result<T, BackingError>) {
        let mut health = self.health.lock();
        match result {
            Ok(_) => {
                // A call admitted before a failure must not end the cool-down
                if permit == Permit::Trial {
                    info!("Backing tier trial call succeeded, re-enabling");
                    *health = Health::Enabled;
                }
            }
            Err(BackingError::Rejected(reason)) => {
                warn!("Backing tier refused {} for key {}: {}", op, key, reason);
                if permit == Permit::Trial {
                    info!("Backing tier answered trial call, re-enabling");
                    *health = Health::Enabled;
                }
            }
            Err(err) => {
                warn!(
                    "Backing tier {} failed for key {}: {}; disabling for {:?}",
                    op, key, err, self.cooldown
                );
                *health = Health::Disabled {
                    until: self.cooldown_deadline(),
                };
            }
        }
    }

    fn cooldown_deadline(&self) -> Instant {
        let now = Instant::now();
        now.checked_add(self.cooldown)
            .or_else(|| now.checked_add(MAX_COOLDOWN))
            .unwrap_or(now)
    }

    /// Runs `call` under the timeout and records the outcome.
    async fn guarded<T, F>(&self, op: &str, key: &str, permit: Permit, call: F) -> Option<T>
    where
        F: std::future::Future<Output = Result<T, BackingError>>,
    {
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(BackingError::Timeout(self.timeout)),
        };
        self.release(permit, op, key, &result);
        result.ok()
    }

    // == Get ==
    /// Fetches and decodes a value. Any failure reads as a miss.
    pub async fn get(&self, key: &str) -> Option<CacheValue> {
        let (store, permit) = self.acquire()?;
        let full_key = self.namespaced(key);

        let bytes = self
            .guarded("get", &full_key, permit, store.get(&full_key))
            .await
            .flatten()?;

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                // Corrupt data is not an outage; skip it without cooling down
                warn!("Backing tier value for {} could not be decoded: {}", full_key, err);
                None
            }
        }
    }

    // == Set ==
    /// Mirrors a value with the given TTL. Returns whether it was stored.
    pub async fn set(&self, key: &str, value: &CacheValue, ttl: Duration) -> bool {
        if self.store.is_none() {
            return false;
        }

        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Skipping backing tier write for {}: {}", key, err);
                return false;
            }
        };

        let Some((store, permit)) = self.acquire() else {
            debug!("Backing tier unavailable, skipping write for {}", key);
            return false;
        };
        let full_key = self.namespaced(key);

        self.guarded("set", &full_key, permit, store.set(&full_key, bytes, ttl_secs(ttl)))
            .await
            .is_some()
    }

    // == Delete ==
    /// Removes a value. Returns whether the service acknowledged it.
    pub async fn delete(&self, key: &str) -> bool {
        let Some((store, permit)) = self.acquire() else {
            return false;
        };
        let full_key = self.namespaced(key);

        self.guarded("delete", &full_key, permit, store.delete(&full_key))
            .await
            .is_some()
    }
}

/// Whole seconds for the service, rounded up, never zero, capped.
fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs().saturating_add(u64::from(ttl.subsec_nanos() > 0));
    secs.clamp(1, MAX_TTL_SECS)
}
