//! Cache Engine Module
//!
//! Composes the fast tier, the backing tier, an eviction policy and the
//! statistics tracker behind get/set/delete/clear/optimize.
//!
//! The fast tier sits behind one coarse lock. Eviction runs inside `put`
//! under that lock; backing-tier I/O always happens with the lock released.

use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::backing::BackingTier;
use crate::cache::{
    AdaptiveWeights, CacheValue, EvictionPolicy, FastTier, StatsSnapshot, StatsTracker, MAX_KEY_LENGTH,
};
use crate::error::{CacheError, Result};

// == Write Tier ==
/// Where a `set` should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteTier {
    /// Fast tier only
    FastOnly,
    /// Fast tier, mirrored best-effort to the backing tier
    #[default]
    WriteThrough,
}

// == Tuning Config ==
/// Thresholds of the self-tuning pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuningConfig {
    /// Below this hit rate the policy switches to adaptive
    pub hit_rate_threshold: f64,
    /// Above this average latency the default TTL grows
    pub latency_threshold: Duration,
    /// Multiplier applied to the default TTL
    pub ttl_growth: f64,
    /// Ceiling for the grown default TTL
    pub max_ttl: Duration,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            hit_rate_threshold: 0.7,
            latency_threshold: Duration::from_millis(10),
            ttl_growth: 1.2,
            max_ttl: Duration::from_secs(3600),
        }
    }
}

// == Engine Config ==
/// Construction parameters of one engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Byte budget of the fast tier
    pub max_memory_bytes: u64,
    /// TTL applied when `set` omits one
    pub default_ttl: Duration,
    /// Initial eviction policy
    pub policy: EvictionPolicy,
    /// Self-tuning thresholds
    pub tuning: TuningConfig,
    /// Tier used by plain `set`
    pub write_tier: WriteTier,
    /// Adaptive scoring constants
    pub weights: AdaptiveWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_memory_bytes: 100_000_000,
            default_ttl: Duration::from_secs(300),
            policy: EvictionPolicy::Adaptive,
            tuning: TuningConfig::default(),
            write_tier: WriteTier::WriteThrough,
            weights: AdaptiveWeights::default(),
        }
    }
}

// == Engine Settings ==
/// Forward-looking configuration that `optimize` may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub policy: EvictionPolicy,
    pub default_ttl: Duration,
}

/// Decides the settings after a tuning pass over `stats`.
///
/// A hit rate under the threshold switches to the adaptive policy; an
/// average latency over the threshold grows the default TTL, capped.
pub fn plan_tuning(current: EngineSettings, stats: &StatsSnapshot, tuning: &TuningConfig) -> EngineSettings {
    let mut next = current;

    if stats.hit_rate() < tuning.hit_rate_threshold {
        next.policy = EvictionPolicy::Adaptive;
    }

    if stats.avg_response_time > tuning.latency_threshold && current.default_ttl < tuning.max_ttl {
        let grown_ms = (current.default_ttl.as_millis() as f64 * tuning.ttl_growth).round();
        let grown = Duration::from_millis(grown_ms as u64);
        next.default_ttl = grown.clamp(current.default_ttl, tuning.max_ttl);
    }

    next
}

// == Cache Engine ==
/// One cache namespace: fast tier, backing tier, statistics and settings.
#[derive(Debug)]
pub struct CacheEngine {
    name: String,
    fast: Mutex<FastTier>,
    backing: BackingTier,
    stats: StatsTracker,
    settings: RwLock<EngineSettings>,
    tuning: TuningConfig,
    write_tier: WriteTier,
}

impl CacheEngine {
    // == Constructor ==
    /// Creates an engine named `name` over the given backing tier.
    pub fn new(name: impl Into<String>, config: &EngineConfig, backing: BackingTier) -> Self {
        Self {
            name: name.into(),
            fast: Mutex::new(FastTier::with_weights(config.max_memory_bytes, config.weights)),
            backing,
            stats: StatsTracker::new(),
            settings: RwLock::new(EngineSettings {
                policy: config.policy,
                default_ttl: config.default_ttl,
            }),
            tuning: config.tuning,
            write_tier: config.write_tier,
        }
    }

    /// Creates an engine with no backing tier.
    pub fn local(name: impl Into<String>, config: &EngineConfig) -> Self {
        Self::new(name, config, BackingTier::none())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backing(&self) -> &BackingTier {
        &self.backing
    }

    // == Get ==
    /// Looks a key up in the fast tier, then the backing tier.
    ///
    /// A backing-tier hit is promoted into the fast tier with the current
    /// default TTL.
    pub async fn get(&self, key: &str) -> Option<CacheValue> {
        let started = Instant::now();

        let cached = self.fast.lock().lookup(key);
        if let Some(value) = cached {
            self.stats.record_hit(started.elapsed());
            debug!("[{}] fast tier HIT for key: {}", self.name, key);
            return Some(value);
        }

        if let Some(value) = self.backing.get(key).await {
            let settings = self.settings();
            self.insert_fast(key.to_string(), value.clone(), Some(settings.default_ttl), settings.policy);
            self.stats.record_hit(started.elapsed());
            debug!("[{}] backing tier HIT for key: {}, promoted", self.name, key);
            return Some(value);
        }

        self.stats.record_miss(started.elapsed());
        debug!("[{}] cache MISS for key: {}", self.name, key);
        None
    }

    // == Set ==
    /// Stores a value using the engine's default write tier.
    pub async fn set(&self, key: impl Into<String>, value: CacheValue, ttl: Option<Duration>) -> Result<()> {
        self.set_with_tier(key, value, ttl, self.write_tier).await
    }

    /// Stores a value in the fast tier and, if asked, mirrors it.
    ///
    /// Only invalid arguments fail; a failed mirror is logged and ignored.
    pub async fn set_with_tier(
        &self,
        key: impl Into<String>,
        value: CacheValue,
        ttl: Option<Duration>,
        tier: WriteTier,
    ) -> Result<()> {
        let key = key.into();
        validate_key(&key)?;
        validate_ttl(ttl)?;

        let settings = self.settings();
        let effective_ttl = ttl.unwrap_or(settings.default_ttl);

        match tier {
            WriteTier::FastOnly => {
                self.insert_fast(key, value, Some(effective_ttl), settings.policy);
            }
            WriteTier::WriteThrough => {
                self.insert_fast(key.clone(), value.clone(), Some(effective_ttl), settings.policy);
                if self.backing.is_configured() && !self.backing.set(&key, &value, effective_ttl).await {
                    debug!("[{}] backing tier write skipped for key: {}", self.name, key);
                }
            }
        }

        Ok(())
    }

    fn insert_fast(&self, key: String, value: CacheValue, ttl: Option<Duration>, policy: EvictionPolicy) {
        let (outcome, size, budget) = {
            let mut fast = self.fast.lock();
            let outcome = fast.put(key, value, ttl, policy);
            (outcome, fast.size_bytes(), fast.max_memory_bytes())
        };

        for victim in &outcome.evicted {
            self.stats.record_eviction();
            debug!("[{}] evicted key: {} ({})", self.name, victim, policy);
        }

        if outcome.oversized {
            self.stats.record_oversized();
            warn!(
                "[{}] single entry of {} bytes exceeds fast tier budget of {} bytes",
                self.name, size, budget
            );
        }
    }

    // == Delete ==
    /// Removes a key from both tiers. Returns whether the fast tier held it.
    pub async fn delete(&self, key: &str) -> bool {
        let removed = self.fast.lock().remove(key);

        if self.backing.is_configured() && !self.backing.delete(key).await {
            warn!("[{}] backing tier delete not confirmed for key: {}", self.name, key);
        }

        removed
    }

    // == Clear ==
    /// Empties the fast tier and resets statistics.
    ///
    /// The backing tier's key space is left alone.
    pub fn clear(&self) {
        self.fast.lock().clear();
        self.stats.reset();
        info!("[{}] cache cleared", self.name);
    }

    // == Stats ==
    /// Returns a statistics snapshot.
    pub fn stats(&self) -> StatsSnapshot {
        let (size, count) = {
            let fast = self.fast.lock();
            (fast.size_bytes(), fast.len())
        };
        self.stats.snapshot(size, count)
    }

    // == Settings ==
    pub fn settings(&self) -> EngineSettings {
        *self.settings.read()
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.settings().policy
    }

    pub fn default_ttl(&self) -> Duration {
        self.settings().default_ttl
    }

    /// Administrative override of the eviction policy.
    pub fn set_policy(&self, policy: EvictionPolicy) {
        self.settings.write().policy = policy;
        info!("[{}] eviction policy set to {}", self.name, policy);
    }

    /// Administrative override of the default TTL.
    pub fn set_default_ttl(&self, ttl: Duration) -> Result<()> {
        validate_ttl(Some(ttl))?;
        self.settings.write().default_ttl = ttl;
        info!("[{}] default TTL set to {:?}", self.name, ttl);
        Ok(())
    }

    // == Optimize ==
    /// Runs one self-tuning pass. Never touches resident entries.
    pub fn optimize(&self) -> EngineSettings {
        self.optimize_with(&self.stats())
    }

    /// Runs a tuning pass against the given snapshot.
    pub fn optimize_with(&self, stats: &StatsSnapshot) -> EngineSettings {
        let mut settings = self.settings.write();
        let next = plan_tuning(*settings, stats, &self.tuning);

        if next.policy != settings.policy {
            info!(
                "[{}] switched to {} eviction due to hit rate {:.2}",
                self.name,
                next.policy,
                stats.hit_rate()
            );
        }
        if next.default_ttl != settings.default_ttl {
            info!(
                "[{}] increased default TTL to {:?} (avg response {:?})",
                self.name, next.default_ttl, stats.avg_response_time
            );
        }

        *settings = next;
        next
    }

    // == Purge Expired ==
    /// Drops expired entries from the fast tier. Returns how many.
    pub fn purge_expired(&self) -> usize {
        self.fast.lock().purge_expired()
    }

    /// Whether the fast tier holds a live entry, without counting a read.
    pub fn contains(&self, key: &str) -> bool {
        self.fast.lock().contains(key)
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

fn validate_ttl(ttl: Option<Duration>) -> Result<()> {
    match ttl {
        Some(ttl) if ttl.is_zero() => Err(CacheError::InvalidRequest(
            "TTL must be greater than zero".to_string(),
        )),
        _ => Ok(()),
    }
}
