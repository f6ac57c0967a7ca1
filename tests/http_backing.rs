//! HTTP Backing Tier Tests
//!
//! One server instance backs another over a real socket.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tiered_cache::{
    api::create_router,
    backing::{BackingConfig, BackingStore},
    cache::{CacheRegistry, EngineConfig},
    AppState, HttpBackingStore,
};
use tokio::net::TcpListener;

// == Helpers ==

/// Serves a fast-tier-only instance on an ephemeral port and returns its URL.
async fn spawn_peer() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(AppState::new(CacheRegistry::local(EngineConfig::default())));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn backed_registry(url: &str) -> CacheRegistry {
    let store = HttpBackingStore::new(url, Duration::from_secs(2)).unwrap();
    CacheRegistry::new(
        EngineConfig::default(),
        Some(Arc::new(store) as Arc<dyn BackingStore>),
        BackingConfig::default(),
    )
}

// == Tests ==

#[tokio::test]
async fn test_instances_share_values_through_peer() {
    let url = spawn_peer().await;
    let writer = backed_registry(&url).default_cache();
    let reader = backed_registry(&url).default_cache();

    writer.set("config", json!({"mode": "fast"}), None).await.unwrap();

    assert_eq!(reader.get("config").await, Some(json!({"mode": "fast"})));
    assert!(reader.backing().is_available());
}

#[tokio::test]
async fn test_key_too_long_for_peer_keeps_tier_enabled() {
    let url = spawn_peer().await;
    let writer = backed_registry(&url).default_cache();
    let reader = backed_registry(&url).default_cache();

    // Valid locally, but the namespace prefix pushes it past the peer's limit
    let long_key = "k".repeat(240);
    writer.set(long_key.clone(), json!(1), None).await.unwrap();

    assert_eq!(writer.get(&long_key).await, Some(json!(1)));
    assert!(writer.backing().is_available());

    writer.set("short", json!(2), None).await.unwrap();
    assert_eq!(reader.get("short").await, Some(json!(2)));
    assert!(reader.backing().is_available());
}
