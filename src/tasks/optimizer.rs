//! Self-Tuning Task
//!
//! Background task that periodically runs a tuning pass on every cache.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheRegistry;

/// Spawns a background task that calls `optimize` on every engine.
///
/// A pass only changes forward-looking settings (policy, default TTL);
/// resident entries keep their own TTLs.
pub fn spawn_optimizer_task(registry: Arc<CacheRegistry>, optimize_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(optimize_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting self-tuning task with interval of {} seconds",
            optimize_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let tuned = registry.optimize_all();
            for (name, settings) in &tuned {
                debug!(
                    "Tuning pass on '{}': policy={}, default_ttl={:?}",
                    name, settings.policy, settings.default_ttl
                );
            }
        }
    })
}
