//! Cache Entry Module
//!
//! Defines the unit of storage held by the fast tier, with TTL support and
//! access bookkeeping.

use std::time::{Duration, Instant};

use crate::cache::CacheValue;

/// Size charged for a value whose footprint cannot be measured.
pub const FALLBACK_SIZE_BYTES: u64 = 1000;

/// Size charged for scalar JSON values (numbers, booleans, null).
const SCALAR_SIZE_BYTES: u64 = 8;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The key this entry is stored under
    pub key: String,
    /// The stored value
    pub value: CacheValue,
    /// When the entry was inserted
    pub created_at: Instant,
    /// When the entry was last read (or inserted)
    pub last_accessed: Instant,
    /// Number of successful reads, starting at 1 on insert
    pub access_count: u64,
    /// Time-to-live, None = never expires
    pub ttl: Option<Duration>,
    /// Estimated in-memory footprint of the value
    pub size_bytes: u64,
    /// Logical insertion stamp, strictly increasing per store
    pub(crate) insert_seq: u64,
    /// Logical access stamp, strictly increasing per store
    pub(crate) access_seq: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry, sized from its value.
    ///
    /// # Arguments
    /// * `key` - The key the entry is stored under
    /// * `value` - The value to store
    /// * `ttl` - Optional time-to-live
    pub fn new(key: String, value: CacheValue, ttl: Option<Duration>) -> Self {
        let now = Instant::now();
        let size_bytes = estimate_size(&value);

        Self {
            key,
            value,
            created_at: now,
            last_accessed: now,
            access_count: 1,
            ttl,
            size_bytes,
            insert_seq: 0,
            access_seq: 0,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has outlived its TTL.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Checks expiry against a given instant.
    ///
    /// An entry is expired once strictly more than `ttl` has elapsed since
    /// creation. Entries without a TTL never expire.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(self.created_at) > ttl,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or None if no TTL is set.
    ///
    /// Returns `Some(Duration::ZERO)` once the entry has expired.
    pub fn ttl_remaining_at(&self, now: Instant) -> Option<Duration> {
        self.ttl.map(|ttl| {
            let age = now.saturating_duration_since(self.created_at);
            ttl.saturating_sub(age)
        })
    }

    // == Touch ==
    /// Records a successful read.
    pub(crate) fn touch(&mut self, now: Instant, seq: u64) {
        // Instant is monotonic, but never let last_accessed precede created_at
        self.last_accessed = now.max(self.created_at);
        self.access_count = self.access_count.saturating_add(1);
        self.access_seq = seq;
    }
}

// == Size Estimation ==
/// Estimates the in-memory footprint of a value.
///
/// Strings are charged their UTF-8 byte length, scalars a fixed word, and
/// structured values their serialized JSON length. Values that fail to
/// serialize are charged [`FALLBACK_SIZE_BYTES`].
pub fn estimate_size(value: &CacheValue) -> u64 {
    match value {
        CacheValue::String(s) => s.len() as u64,
        CacheValue::Number(_) | CacheValue::Bool(_) | CacheValue::Null => SCALAR_SIZE_BYTES,
        CacheValue::Array(_) | CacheValue::Object(_) => serde_json::to_vec(value)
            .map(|bytes| bytes.len() as u64)
            .unwrap_or(FALLBACK_SIZE_BYTES),
    }
}
