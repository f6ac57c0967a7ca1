//! Fast Tier Module
//!
//! Bounded in-process store combining HashMap storage with ordered indexes
//! for recency, insertion age and access frequency. Capacity is a byte
//! budget; eviction runs inside `put` until the new entry fits.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::{Duration, Instant};

use crate::cache::eviction::{choose_victim, AdaptiveWeights, EvictionPolicy, ResidentSet};
use crate::cache::{CacheEntry, CacheValue};

// == Put Outcome ==
/// What a `put` had to do to make room.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOutcome {
    /// Keys evicted, in eviction order
    pub evicted: Vec<String>,
    /// The new entry alone exceeds the byte budget
    pub oversized: bool,
}

// == Fast Tier ==
/// Byte-bounded map from key to entry.
#[derive(Debug)]
pub struct FastTier {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// access_seq -> key, oldest access first
    recency: BTreeMap<u64, String>,
    /// insert_seq -> key, oldest insert first
    insertion: BTreeMap<u64, String>,
    /// (access_count, key), least frequent first
    frequency: BTreeSet<(u64, String)>,
    /// Sum of resident entries' sizes
    size_bytes: u64,
    /// Byte budget
    max_memory_bytes: u64,
    /// Logical clock for the recency and insertion indexes
    seq: u64,
    weights: AdaptiveWeights,
}

impl FastTier {
    // == Constructor ==
    /// Creates an empty store with the given byte budget.
    pub fn new(max_memory_bytes: u64) -> Self {
        Self::with_weights(max_memory_bytes, AdaptiveWeights::default())
    }

    /// Creates an empty store with custom adaptive scoring constants.
    pub fn with_weights(max_memory_bytes: u64, weights: AdaptiveWeights) -> Self {
        Self {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            insertion: BTreeMap::new(),
            frequency: BTreeSet::new(),
            size_bytes: 0,
            max_memory_bytes,
            seq: 0,
            weights,
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    // == Lookup ==
    /// Returns a copy of the value if present and live.
    ///
    /// Expired entries are purged and reported absent. A hit bumps the
    /// entry's recency and access count.
    pub fn lookup(&mut self, key: &str) -> Option<CacheValue> {
        let now = Instant::now();

        let expired = self.entries.get(key)?.is_expired_at(now);
        if expired {
            self.remove(key);
            return None;
        }

        let seq = self.next_seq();
        let entry = self.entries.get_mut(key)?;
        let old_seq = entry.access_seq;
        let old_count = entry.access_count;
        entry.touch(now, seq);
        let new_count = entry.access_count;
        let value = entry.value.clone();

        self.recency.remove(&old_seq);
        self.recency.insert(seq, key.to_string());
        self.frequency.remove(&(old_count, key.to_string()));
        self.frequency.insert((new_count, key.to_string()));

        Some(value)
    }

    // == Put ==
    /// Stores a value, replacing any entry under the same key.
    ///
    /// Resident bytes stay strictly under the budget: while adding the new
    /// entry would reach it, asks `policy` for a victim against the current
    /// resident set and removes it. An entry that alone fills the budget is
    /// still stored once everything else is gone.
    pub fn put(
        &mut self,
        key: String,
        value: CacheValue,
        ttl: Option<Duration>,
        policy: EvictionPolicy,
    ) -> PutOutcome {
        let mut entry = CacheEntry::new(key, value, ttl);
        let mut outcome = PutOutcome::default();

        // The replaced entry must neither count against the budget nor be chosen
        self.remove(&entry.key);

        let now = Instant::now();
        while self.size_bytes + entry.size_bytes >= self.max_memory_bytes && !self.entries.is_empty() {
            match choose_victim(policy, &*self, now, &self.weights) {
                Some(victim) => {
                    self.remove(&victim);
                    outcome.evicted.push(victim);
                }
                None => break,
            }
        }
        outcome.oversized = entry.size_bytes > self.max_memory_bytes;

        let seq = self.next_seq();
        entry.insert_seq = seq;
        entry.access_seq = seq;

        self.recency.insert(seq, entry.key.clone());
        self.insertion.insert(seq, entry.key.clone());
        self.frequency.insert((entry.access_count, entry.key.clone()));
        self.size_bytes += entry.size_bytes;
        self.entries.insert(entry.key.clone(), entry);

        outcome
    }

    // == Remove ==
    /// Removes an entry. Returns whether one was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(entry) = self.entries.remove(key) else {
            return false;
        };

        let CacheEntry {
            key,
            access_count,
            access_seq,
            insert_seq,
            size_bytes,
            ..
        } = entry;

        self.recency.remove(&access_seq);
        self.insertion.remove(&insert_seq);
        self.frequency.remove(&(access_count, key));
        self.size_bytes = self.size_bytes.saturating_sub(size_bytes);
        true
    }

    // == Clear ==
    /// Removes every entry and zeroes the aggregate size.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
        self.insertion.clear();
        self.frequency.clear();
        self.size_bytes = 0;
    }

    // == Purge Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.is_expired_at(now))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }

    /// Checks for a live entry without counting it as a read.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    /// Returns the resident entry without counting it as a read.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current sum of resident entry sizes.
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn max_memory_bytes(&self) -> u64 {
        self.max_memory_bytes
    }
}

impl ResidentSet for FastTier {
    fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.values()
    }

    fn least_recently_used(&self) -> Option<&CacheEntry> {
        let (_, key) = self.recency.first_key_value()?;
        self.entries.get(key)
    }

    fn least_frequently_used(&self) -> Option<&CacheEntry> {
        let (_, key) = self.frequency.first()?;
        self.entries.get(key)
    }

    fn oldest(&self) -> Option<&CacheEntry> {
        let (_, key) = self.insertion.first_key_value()?;
        self.entries.get(key)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;

    const HOUR: Option<Duration> = Some(Duration::from_secs(3600));

    fn put(store: &mut FastTier, key: &str, size: usize, policy: EvictionPolicy) -> PutOutcome {
        store.put(key.to_string(), json!("x".repeat(size)), HOUR, policy)
    }

    #[test]
    fn test_store_new() {
        let store = FastTier::new(1000);
        assert!(store.is_empty());
        assert_eq!(store.size_bytes(), 0);
        assert_eq!(store.max_memory_bytes(), 1000);
    }

    #[test]
    fn test_put_and_lookup() {
        let mut store = FastTier::new(1000);

        store.put("key1".to_string(), json!("value1"), HOUR, EvictionPolicy::Lru);

        assert_eq!(store.lookup("key1"), Some(json!("value1")));
        assert_eq!(store.len(), 1);
        assert_eq!(store.size_bytes(), 6);
    }

    #[test]
    fn test_lookup_updates_access() {
        let mut store = FastTier::new(1000);
        store.put("k".to_string(), json!("v"), None, EvictionPolicy::Lru);

        store.lookup("k");
        store.lookup("k");

        let entry = store.peek("k").unwrap();
        assert_eq!(entry.access_count, 3);
        assert!(entry.last_accessed >= entry.created_at);
    }

    #[test]
    fn test_lookup_missing() {
        let mut store = FastTier::new(1000);
        assert_eq!(store.lookup("nope"), None);
    }

    #[test]
    fn test_overwrite_adjusts_size() {
        let mut store = FastTier::new(1000);

        store.put("k".to_string(), json!("aaaaaaaaaa"), None, EvictionPolicy::Lru);
        assert_eq!(store.size_bytes(), 10);

        store.put("k".to_string(), json!("bb"), None, EvictionPolicy::Lru);

        assert_eq!(store.len(), 1);
        assert_eq!(store.size_bytes(), 2);
        assert_eq!(store.lookup("k"), Some(json!("bb")));
    }

    #[test]
    fn test_overwrite_does_not_evict_itself_needlessly() {
        let mut store = FastTier::new(600);
        put(&mut store, "k1", 250, EvictionPolicy::Lru);
        put(&mut store, "k2", 250, EvictionPolicy::Lru);

        // Replacing k1 at the same size fits once the old copy is gone
        let outcome = put(&mut store, "k1", 250, EvictionPolicy::Lru);

        assert!(outcome.evicted.is_empty());
        assert!(store.contains("k2"));
        assert_eq!(store.size_bytes(), 500);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = FastTier::new(1000);
        store.put("k".to_string(), json!("v"), None, EvictionPolicy::Lru);

        assert!(store.remove("k"));
        assert!(!store.remove("k"));
        assert!(store.is_empty());
        assert_eq!(store.size_bytes(), 0);
    }

    #[test]
    fn test_clear() {
        let mut store = FastTier::new(1000);
        put(&mut store, "k1", 100, EvictionPolicy::Lru);
        put(&mut store, "k2", 100, EvictionPolicy::Lru);

        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.size_bytes(), 0);
        assert_eq!(store.lookup("k1"), None);
    }

    #[test]
    fn test_expired_entry_purged_on_lookup() {
        let mut store = FastTier::new(1000);
        store.put(
            "k".to_string(),
            json!("v"),
            Some(Duration::from_millis(100)),
            EvictionPolicy::Lru,
        );

        assert!(store.lookup("k").is_some());
        sleep(Duration::from_millis(150));

        assert_eq!(store.lookup("k"), None);
        assert!(store.is_empty());
        assert_eq!(store.size_bytes(), 0);
    }

    #[test]
    fn test_purge_expired() {
        let mut store = FastTier::new(1000);
        store.put("short".to_string(), json!("v"), Some(Duration::from_millis(50)), EvictionPolicy::Lru);
        store.put("long".to_string(), json!("v"), HOUR, EvictionPolicy::Lru);

        sleep(Duration::from_millis(100));

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.contains("long"));
    }

    #[test]
    fn test_lru_eviction_respects_reads() {
        let mut store = FastTier::new(800);
        put(&mut store, "a", 250, EvictionPolicy::Lru);
        put(&mut store, "b", 250, EvictionPolicy::Lru);
        put(&mut store, "c", 250, EvictionPolicy::Lru);

        store.lookup("a");

        let outcome = put(&mut store, "d", 250, EvictionPolicy::Lru);

        assert_eq!(outcome.evicted, vec!["b".to_string()]);
        assert!(store.contains("a"));
        assert!(store.contains("c"));
        assert!(store.contains("d"));
    }

    #[test]
    fn test_lfu_eviction() {
        let mut store = FastTier::new(800);
        put(&mut store, "a", 250, EvictionPolicy::Lfu);
        put(&mut store, "b", 250, EvictionPolicy::Lfu);
        put(&mut store, "c", 250, EvictionPolicy::Lfu);

        store.lookup("a");
        store.lookup("a");
        store.lookup("c");

        let outcome = put(&mut store, "d", 250, EvictionPolicy::Lfu);
        assert_eq!(outcome.evicted, vec!["b".to_string()]);
    }

    #[test]
    fn test_lfu_tie_breaks_on_lowest_key() {
        let mut store = FastTier::new(800);
        put(&mut store, "c", 250, EvictionPolicy::Lfu);
        put(&mut store, "b", 250, EvictionPolicy::Lfu);
        put(&mut store, "a", 250, EvictionPolicy::Lfu);

        let outcome = put(&mut store, "d", 250, EvictionPolicy::Lfu);
        assert_eq!(outcome.evicted, vec!["a".to_string()]);
    }

    #[test]
    fn test_age_eviction_ignores_reads() {
        let mut store = FastTier::new(800);
        put(&mut store, "a", 250, EvictionPolicy::Age);
        put(&mut store, "b", 250, EvictionPolicy::Age);
        put(&mut store, "c", 250, EvictionPolicy::Age);

        store.lookup("a");

        let outcome = put(&mut store, "d", 250, EvictionPolicy::Age);
        assert_eq!(outcome.evicted, vec!["a".to_string()]);
    }

    #[test]
    fn test_adaptive_eviction_prefers_large_cold_entries() {
        let mut store = FastTier::new(1000);
        put(&mut store, "big", 600, EvictionPolicy::Adaptive);
        put(&mut store, "small", 100, EvictionPolicy::Adaptive);
        store.lookup("small");

        let outcome = put(&mut store, "new", 400, EvictionPolicy::Adaptive);

        assert_eq!(outcome.evicted, vec!["big".to_string()]);
        assert!(store.contains("small"));
    }

    #[test]
    fn test_eviction_repeats_until_fit() {
        let mut store = FastTier::new(1100);
        for key in ["k1", "k2", "k3", "k4"] {
            put(&mut store, key, 250, EvictionPolicy::Lru);
        }

        let outcome = put(&mut store, "big", 600, EvictionPolicy::Lru);

        assert_eq!(
            outcome.evicted,
            vec!["k1".to_string(), "k2".to_string(), "k3".to_string()]
        );
        assert_eq!(store.size_bytes(), 850);
        assert!(!outcome.oversized);
    }

    #[test]
    fn test_oversized_entry_is_accepted() {
        let mut store = FastTier::new(100);
        put(&mut store, "k1", 50, EvictionPolicy::Lru);

        let outcome = put(&mut store, "huge", 300, EvictionPolicy::Lru);

        assert!(outcome.oversized);
        assert_eq!(outcome.evicted, vec!["k1".to_string()]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.size_bytes(), 300);
    }

    #[test]
    fn test_capacity_scenario_five_entries() {
        let mut store = FastTier::new(1000);

        for key in ["k1", "k2", "k3"] {
            let outcome = store.put(key.to_string(), json!("x".repeat(250)), HOUR, EvictionPolicy::Lru);
            assert!(outcome.evicted.is_empty());
        }

        let outcome = store.put("k4".to_string(), json!("x".repeat(250)), HOUR, EvictionPolicy::Lru);
        assert_eq!(outcome.evicted, vec!["k1".to_string()]);
        assert_eq!(store.size_bytes(), 750);

        let outcome = store.put("k5".to_string(), json!("x".repeat(250)), HOUR, EvictionPolicy::Lru);
        assert_eq!(outcome.evicted, vec!["k2".to_string()]);
        assert_eq!(store.size_bytes(), 750);
        assert!(!outcome.oversized);
    }

    #[test]
    fn test_entry_filling_whole_budget_is_not_oversized() {
        let mut store = FastTier::new(1000);
        put(&mut store, "k1", 10, EvictionPolicy::Lru);

        let outcome = put(&mut store, "full", 1000, EvictionPolicy::Lru);

        assert!(!outcome.oversized);
        assert_eq!(outcome.evicted, vec!["k1".to_string()]);
        assert_eq!(store.size_bytes(), 1000);
    }

    #[test]
    fn test_indexes_track_removals() {
        let mut store = FastTier::new(1000);
        put(&mut store, "a", 100, EvictionPolicy::Lru);
        put(&mut store, "b", 100, EvictionPolicy::Lru);
        store.lookup("a");
        store.remove("b");

        assert_eq!(store.least_recently_used().map(|e| e.key.as_str()), Some("a"));
        assert_eq!(store.oldest().map(|e| e.key.as_str()), Some("a"));
        assert_eq!(store.least_frequently_used().map(|e| e.key.as_str()), Some("a"));
    }
}
