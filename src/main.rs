//! Tiered Cache - A multi-tier adaptive cache server
//!
//! Serves named caches over HTTP, with an optional shared backing tier.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiered_cache::api::create_router;
use tiered_cache::{spawn_cleanup_task, spawn_optimizer_task, AppState, BackingStore, Config, HttpBackingStore};

/// Main entry point for the tiered cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect the backing tier, if one is configured
/// 4. Create the cache registry and its default cache
/// 5. Start background TTL cleanup and self-tuning tasks
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiered_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tiered Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_memory_bytes={}, default_ttl={}s, policy={}, port={}",
        config.max_memory_bytes, config.default_ttl, config.eviction_policy, config.server_port
    );

    let backing_store = connect_backing(&config);
    let state = AppState::from_config(&config, backing_store);
    info!("Cache registry initialized");

    let cleanup_handle = spawn_cleanup_task(state.registry.clone(), config.cleanup_interval);
    let optimizer_handle = spawn_optimizer_task(state.registry.clone(), config.optimize_interval);
    info!("Background tasks started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(vec![cleanup_handle, optimizer_handle]))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Builds the backing store client. A bad URL only disables the backing tier.
fn connect_backing(config: &Config) -> Option<Arc<dyn BackingStore>> {
    let url = config.backing_url.as_deref()?;
    let timeout = Duration::from_millis(config.backing_timeout_ms);

    match HttpBackingStore::new(url, timeout) {
        Ok(store) => {
            info!("Backing tier configured at {}", url);
            Some(Arc::new(store))
        }
        Err(e) => {
            warn!("Backing tier disabled, running fast tier only: {}", e);
            None
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the background tasks and allows graceful shutdown.
async fn shutdown_signal(handles: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    for handle in handles {
        handle.abort();
    }
    warn!("Background tasks aborted");
}
