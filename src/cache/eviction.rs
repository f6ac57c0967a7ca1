//! Eviction Strategy Module
//!
//! Pure victim selection for the four eviction policies. The fast tier
//! exposes its resident set through [`ResidentSet`]; the default methods
//! answer each query by scanning, and indexed stores override them.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::cache::CacheEntry;

// == Eviction Policy ==
/// Which entry to sacrifice when the fast tier is over budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Least recently read
    Lru,
    /// Least frequently read
    Lfu,
    /// Earliest inserted, regardless of reads
    Age,
    /// Lowest composite score of recency, frequency, remaining TTL and size
    #[default]
    Adaptive,
}

impl EvictionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionPolicy::Lru => "lru",
            EvictionPolicy::Lfu => "lfu",
            EvictionPolicy::Age => "age",
            EvictionPolicy::Adaptive => "adaptive",
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(EvictionPolicy::Lru),
            "lfu" => Ok(EvictionPolicy::Lfu),
            "age" => Ok(EvictionPolicy::Age),
            "adaptive" => Ok(EvictionPolicy::Adaptive),
            other => Err(format!("unknown eviction policy: {}", other)),
        }
    }
}

// == Adaptive Weights ==
/// Normalisation constants of the adaptive score.
///
/// Any values work as long as they stay positive: a warmer, more frequently
/// read, smaller entry always outscores a colder, rarer, larger one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveWeights {
    /// Reads per unit of frequency score
    pub frequency_divisor: f64,
    /// Bytes per unit of size penalty
    pub size_divisor: f64,
}

impl Default for AdaptiveWeights {
    fn default() -> Self {
        Self {
            frequency_divisor: 10.0,
            size_divisor: 1000.0,
        }
    }
}

/// Scores an entry for adaptive eviction; higher survives longer.
pub fn adaptive_score(entry: &CacheEntry, now: Instant, weights: &AdaptiveWeights) -> f64 {
    let idle = now.saturating_duration_since(entry.last_accessed).as_secs_f64();
    let recency = 1.0 / (idle + 1.0);
    let frequency = entry.access_count as f64 / weights.frequency_divisor;

    let ttl_fraction = match entry.ttl {
        Some(ttl) if !ttl.is_zero() => {
            let remaining = entry.ttl_remaining_at(now).unwrap_or_default();
            (remaining.as_secs_f64() / ttl.as_secs_f64()).clamp(0.0, 1.0)
        }
        _ => 1.0,
    };

    let size_penalty = entry.size_bytes.max(1) as f64 / weights.size_divisor;

    (recency + frequency + ttl_fraction) / size_penalty
}

// == Resident Set ==
/// Read-only view of the entries eligible for eviction.
///
/// Ties are broken by the lowest key.
pub trait ResidentSet {
    /// All resident entries, in no particular order.
    fn entries(&self) -> impl Iterator<Item = &CacheEntry>;

    /// Entry with the smallest `last_accessed`.
    fn least_recently_used(&self) -> Option<&CacheEntry> {
        self.entries()
            .min_by(|a, b| a.last_accessed.cmp(&b.last_accessed).then_with(|| a.key.cmp(&b.key)))
    }

    /// Entry with the smallest `access_count`.
    fn least_frequently_used(&self) -> Option<&CacheEntry> {
        self.entries()
            .min_by(|a, b| a.access_count.cmp(&b.access_count).then_with(|| a.key.cmp(&b.key)))
    }

    /// Entry with the smallest `created_at`.
    fn oldest(&self) -> Option<&CacheEntry> {
        self.entries()
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.key.cmp(&b.key)))
    }
}

// == Choose Victim ==
/// Picks exactly one entry to evict, or None if nothing is resident.
///
/// Must be called again after every removal: the next victim depends on the
/// set that remains.
pub fn choose_victim<R: ResidentSet + ?Sized>(
    policy: EvictionPolicy,
    resident: &R,
    now: Instant,
    weights: &AdaptiveWeights,
) -> Option<String> {
    let victim = match policy {
        EvictionPolicy::Lru => resident.least_recently_used(),
        EvictionPolicy::Lfu => resident.least_frequently_used(),
        EvictionPolicy::Age => resident.oldest(),
        EvictionPolicy::Adaptive => resident
            .entries()
            .map(|entry| (adaptive_score(entry, now, weights), entry))
            .min_by(|(sa, a), (sb, b)| sa.total_cmp(sb).then_with(|| a.key.cmp(&b.key)))
            .map(|(_, entry)| entry),
    };

    victim.map(|entry| entry.key.clone())
}
