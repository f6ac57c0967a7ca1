//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, evictions and a
//! smoothed response time. Counters are lock-free atomics; none of the
//! recording operations can fail.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Smoothing factor of the response-time moving average.
pub const EMA_ALPHA: f64 = 0.1;

/// Marks the moving average as not yet seeded. Arithmetic on finite samples
/// never produces this NaN bit pattern.
const EMA_UNSET: u64 = u64::MAX;

// == Stats Snapshot ==
/// Immutable copy of an engine's statistics at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsSnapshot {
    /// Lookups satisfied by either tier
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Entries removed to make room
    pub evictions: u64,
    /// Total lookups (hits + misses)
    pub total_requests: u64,
    /// Exponential moving average of lookup latency
    pub avg_response_time: Duration,
    /// Sum of resident entries' sizes
    pub cache_size_bytes: u64,
    /// Number of resident entries
    pub entry_count: usize,
    /// Inserts whose single entry exceeded the byte budget
    pub oversized_inserts: u64,
}

impl StatsSnapshot {
    // == Hit Rate ==
    /// Returns hits / total_requests, or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.hits as f64 / self.total_requests as f64
        }
    }
}

// == Stats Tracker ==
/// Live counters owned by a single engine.
#[derive(Debug)]
pub struct StatsTracker {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    total_requests: AtomicU64,
    oversized_inserts: AtomicU64,
    /// f64 seconds stored as bits
    avg_response_time: AtomicU64,
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsTracker {
    // == Constructor ==
    /// Creates a tracker with all counters at zero.
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            total_requests: AtomicU64::new(0),
            oversized_inserts: AtomicU64::new(0),
            avg_response_time: AtomicU64::new(EMA_UNSET),
        }
    }

    // == Record Hit ==
    /// Counts a satisfied lookup and folds its latency into the average.
    pub fn record_hit(&self, latency: Duration) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency);
    }

    // == Record Miss ==
    /// Counts an unsatisfied lookup and folds its latency into the average.
    pub fn record_miss(&self, latency: Duration) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency);
    }

    // == Record Eviction ==
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts an insert that alone exceeded the byte budget.
    pub fn record_oversized(&self) {
        self.oversized_inserts.fetch_add(1, Ordering::Relaxed);
    }

    fn record_latency(&self, latency: Duration) {
        let sample = latency.as_secs_f64();
        // fetch_update only fails when the closure returns None
        let _ = self
            .avg_response_time
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                let next = if bits == EMA_UNSET {
                    sample
                } else {
                    EMA_ALPHA * sample + (1.0 - EMA_ALPHA) * f64::from_bits(bits)
                };
                Some(next.to_bits())
            });
    }

    // == Snapshot ==
    /// Copies the current counters.
    ///
    /// Size and entry count belong to the fast tier and are supplied by the
    /// caller, read under the fast-tier lock.
    pub fn snapshot(&self, cache_size_bytes: u64, entry_count: usize) -> StatsSnapshot {
        let bits = self.avg_response_time.load(Ordering::Relaxed);
        let avg_secs = if bits == EMA_UNSET {
            0.0
        } else {
            f64::from_bits(bits)
        };

        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            total_requests: self.total_requests.load(Ordering::Relaxed),
            avg_response_time: Duration::from_secs_f64(avg_secs.max(0.0)),
            cache_size_bytes,
            entry_count,
            oversized_inserts: self.oversized_inserts.load(Ordering::Relaxed),
        }
    }

    // == Reset ==
    /// Zeroes every counter.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.total_requests.store(0, Ordering::Relaxed);
        self.oversized_inserts.store(0, Ordering::Relaxed);
        self.avg_response_time.store(EMA_UNSET, Ordering::Relaxed);
    }
}
