//! TTL Cleanup Task
//!
//! Background task that periodically removes expired entries from every cache.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheRegistry;

/// Spawns a background task that periodically sweeps expired entries.
///
/// Expired entries are already invisible to reads; the sweep only returns
/// their bytes to the budget. Each engine is locked briefly in turn.
///
/// # Arguments
/// * `registry` - Shared registry of every cache
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let registry = Arc::new(CacheRegistry::local(EngineConfig::default()));
/// let cleanup_handle = spawn_cleanup_task(registry.clone(), 1);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(registry: Arc<CacheRegistry>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = registry.purge_expired_all();

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EngineConfig;
    use serde_json::json;

    fn registry() -> Arc<CacheRegistry> {
        Arc::new(CacheRegistry::local(EngineConfig::default()))
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let registry = registry();
        let users = registry.get_or_create("users");
        users
            .set("expire_soon", json!("value"), Some(Duration::from_millis(500)))
            .await
            .unwrap();

        let handle = spawn_cleanup_task(registry.clone(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(users.stats().entry_count, 0, "Expired entry should have been swept");
        assert_eq!(users.stats().cache_size_bytes, 0);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let registry = registry();
        let cache = registry.default_cache();
        cache
            .set("long_lived", json!("value"), Some(Duration::from_secs(3600)))
            .await
            .unwrap();

        let handle = spawn_cleanup_task(registry.clone(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(cache.get("long_lived").await, Some(json!("value")));

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(registry(), 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
