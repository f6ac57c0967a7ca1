//! Cache Module
//!
//! Multi-tier cache: a byte-bounded fast tier in front of an optional
//! backing tier, with pluggable eviction and a self-tuning pass.

mod engine;
mod entry;
mod eviction;
mod fast_tier;
mod registry;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use engine::{plan_tuning, CacheEngine, EngineConfig, EngineSettings, TuningConfig, WriteTier};
pub use entry::{estimate_size, CacheEntry, FALLBACK_SIZE_BYTES};
pub use eviction::{adaptive_score, choose_victim, AdaptiveWeights, EvictionPolicy, ResidentSet};
pub use fast_tier::{FastTier, PutOutcome};
pub use registry::{CacheRegistry, DEFAULT_CACHE};
pub use stats::{StatsSnapshot, StatsTracker, EMA_ALPHA};

/// Values are JSON documents: numbers, strings, sequences and string-keyed maps.
pub type CacheValue = serde_json::Value;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
