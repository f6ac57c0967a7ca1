//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the fast tier and engine against random workloads.

use proptest::prelude::*;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::cache::{CacheEngine, CacheValue, EngineConfig, EvictionPolicy, FastTier};

// == Test Configuration ==
const TEST_MAX_MEMORY_BYTES: u64 = 2_000;
const TEST_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
/// Generates valid cache keys (non-empty, within length limit)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,64}".prop_map(|s| s)
}

/// Generates JSON values of varied shape and size
fn value_strategy() -> impl Strategy<Value = CacheValue> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,400}".prop_map(CacheValue::from),
        any::<i64>().prop_map(CacheValue::from),
        any::<bool>().prop_map(CacheValue::from),
        prop::collection::vec(any::<u16>(), 0..20).prop_map(|v| json!(v)),
    ]
}

fn policy_strategy() -> impl Strategy<Value = EvictionPolicy> {
    prop_oneof![
        Just(EvictionPolicy::Lru),
        Just(EvictionPolicy::Lfu),
        Just(EvictionPolicy::Age),
        Just(EvictionPolicy::Adaptive),
    ]
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: CacheValue },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    // Small key space so gets and deletes regularly land on resident keys
    let key = "k[0-9]{1,2}";
    prop_oneof![
        (key, value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key.prop_map(|key| CacheOp::Get { key }),
        key.prop_map(|key| CacheOp::Delete { key }),
    ]
}

fn engine(policy: EvictionPolicy) -> CacheEngine {
    CacheEngine::local(
        "prop",
        &EngineConfig {
            max_memory_bytes: TEST_MAX_MEMORY_BYTES,
            policy,
            ..EngineConfig::default()
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // The byte total stays under the budget unless a single entry fills it,
    // and always equals the sum of resident entry sizes.
    #[test]
    fn prop_memory_bound(
        policy in policy_strategy(),
        ops in prop::collection::vec(cache_op_strategy(), 1..80),
    ) {
        let mut tier = FastTier::new(TEST_MAX_MEMORY_BYTES);
        let mut keys = HashSet::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    let outcome = tier.put(key.clone(), value, Some(TEST_TTL), policy);
                    for victim in &outcome.evicted {
                        keys.remove(victim);
                    }
                    keys.insert(key);
                }
                CacheOp::Get { key } => {
                    let _ = tier.lookup(&key);
                }
                CacheOp::Delete { key } => {
                    tier.remove(&key);
                    keys.remove(&key);
                }
            }

            prop_assert!(tier.size_bytes() < TEST_MAX_MEMORY_BYTES || tier.len() == 1);
            let summed: u64 = keys
                .iter()
                .filter_map(|k| tier.peek(k))
                .map(|e| e.size_bytes)
                .sum();
            prop_assert_eq!(tier.size_bytes(), summed);
            prop_assert_eq!(tier.len(), keys.len());
        }
    }

    // Hits and misses match a model of what should be resident, and the
    // hit rate is their ratio.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        // Budget large enough that nothing is evicted
        let cache = CacheEngine::local(
            "prop",
            &EngineConfig { max_memory_bytes: 1_000_000, ..EngineConfig::default() },
        );
        let mut model: HashMap<String, CacheValue> = HashMap::new();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        tokio_test::block_on(async {
            for op in ops {
                match op {
                    CacheOp::Set { key, value } => {
                        cache.set(key.clone(), value.clone(), None).await.unwrap();
                        model.insert(key, value);
                    }
                    CacheOp::Get { key } => {
                        let got = cache.get(&key).await;
                        assert_eq!(got.as_ref(), model.get(&key));
                        if got.is_some() {
                            expected_hits += 1;
                        } else {
                            expected_misses += 1;
                        }
                    }
                    CacheOp::Delete { key } => {
                        assert_eq!(cache.delete(&key).await, model.remove(&key).is_some());
                    }
                }
            }
        });

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits);
        prop_assert_eq!(stats.misses, expected_misses);
        prop_assert_eq!(stats.total_requests, expected_hits + expected_misses);
        prop_assert_eq!(stats.evictions, 0);
        prop_assert_eq!(stats.entry_count, model.len());
        if stats.total_requests > 0 {
            let expected = expected_hits as f64 / stats.total_requests as f64;
            prop_assert!((stats.hit_rate() - expected).abs() < 1e-9);
        }
    }

    // A stored value reads back unchanged.
    #[test]
    fn prop_round_trip(key in valid_key_strategy(), value in value_strategy()) {
        let cache = engine(EvictionPolicy::Adaptive);

        let got = tokio_test::block_on(async {
            cache.set(key.clone(), value.clone(), None).await.unwrap();
            cache.get(&key).await
        });

        prop_assert_eq!(got, Some(value));
    }

    // Overwriting keeps one entry, sized by the latest value.
    #[test]
    fn prop_overwrite_replaces(key in valid_key_strategy(), first in value_strategy(), second in value_strategy()) {
        let mut tier = FastTier::new(1_000_000);

        tier.put(key.clone(), first, None, EvictionPolicy::Lru);
        tier.put(key.clone(), second.clone(), None, EvictionPolicy::Lru);

        prop_assert_eq!(tier.len(), 1);
        let expected = crate::cache::CacheEntry::new(key.clone(), second.clone(), None).size_bytes;
        prop_assert_eq!(tier.size_bytes(), expected);
        prop_assert_eq!(tier.lookup(&key), Some(second));
    }

    // Under LRU with equal-sized entries the most recently inserted keys survive.
    #[test]
    fn prop_lru_keeps_most_recent(count in 5usize..40) {
        // 100 bytes per entry, room for 9 under a 1000-byte budget
        let mut tier = FastTier::new(1_000);
        let keys: Vec<String> = (0..count).map(|i| format!("k{:02}", i)).collect();

        for key in &keys {
            tier.put(key.clone(), json!("x".repeat(100)), None, EvictionPolicy::Lru);
        }

        let kept = count.min(9);
        prop_assert_eq!(tier.len(), kept);
        for key in &keys[count - kept..] {
            prop_assert!(tier.contains(key));
        }
    }

    // Clear empties the tier and resets every counter.
    #[test]
    fn prop_clear_resets(ops in prop::collection::vec(cache_op_strategy(), 1..30)) {
        let cache = engine(EvictionPolicy::Lfu);

        tokio_test::block_on(async {
            for op in ops {
                match op {
                    CacheOp::Set { key, value } => {
                        cache.set(key, value, None).await.unwrap();
                    }
                    CacheOp::Get { key } => {
                        cache.get(&key).await;
                    }
                    CacheOp::Delete { key } => {
                        cache.delete(&key).await;
                    }
                }
            }
        });

        cache.clear();
        let stats = cache.stats();
        prop_assert_eq!(stats.hits, 0);
        prop_assert_eq!(stats.misses, 0);
        prop_assert_eq!(stats.evictions, 0);
        prop_assert_eq!(stats.entry_count, 0);
        prop_assert_eq!(stats.cache_size_bytes, 0);
    }
}
