//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint. The unprefixed
//! routes address the default cache; `/caches/:name/...` address a named one.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::backing::BackingStore;
use crate::cache::{CacheEngine, CacheRegistry};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, GlobalStatsResponse, HealthResponse, OptimizeResponse,
    SetRequest, SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Registry of named caches
    pub registry: Arc<CacheRegistry>,
}

impl AppState {
    /// Creates a new AppState around an existing registry.
    pub fn new(registry: CacheRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// `backing_store` is the shared key-value service, if one is reachable.
    pub fn from_config(config: &Config, backing_store: Option<Arc<dyn BackingStore>>) -> Self {
        let registry = CacheRegistry::new(config.engine_config(), backing_store, config.backing_config());
        Self::new(registry)
    }
}

// == Shared Operations ==

async fn set_in(cache: Arc<CacheEngine>, req: SetRequest) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl_duration();
    match req.write_tier() {
        Some(tier) => cache.set_with_tier(req.key.clone(), req.value, ttl, tier).await?,
        None => cache.set(req.key.clone(), req.value, ttl).await?,
    }

    Ok(Json(SetResponse::new(req.key)))
}

async fn get_from(cache: Arc<CacheEngine>, key: String) -> Result<Json<GetResponse>> {
    match cache.get(&key).await {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

async fn delete_from(cache: Arc<CacheEngine>, key: String) -> Result<Json<DeleteResponse>> {
    if cache.delete(&key).await {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

fn stats_of(cache: &CacheEngine) -> StatsResponse {
    StatsResponse::new(&cache.stats(), &cache.settings())
}

// == Default Cache ==

/// Handler for PUT /set
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    set_in(state.registry.default_cache(), req).await
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    get_from(state.registry.default_cache(), key).await
}

/// Handler for DELETE /del/:key
///
/// Returns 404 if the fast tier did not hold the key; the backing tier is
/// cleaned either way.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    delete_from(state.registry.default_cache(), key).await
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(stats_of(&state.registry.default_cache()))
}

// == Named Caches ==

/// Handler for PUT /caches/:name/set
pub async fn named_set_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    set_in(state.registry.get_or_create(&name), req).await
}

/// Handler for GET /caches/:name/get/:key
pub async fn named_get_handler(
    State(state): State<AppState>,
    Path((name, key)): Path<(String, String)>,
) -> Result<Json<GetResponse>> {
    match state.registry.get(&name) {
        Some(cache) => get_from(cache, key).await,
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /caches/:name/del/:key
pub async fn named_delete_handler(
    State(state): State<AppState>,
    Path((name, key)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    let cache = state
        .registry
        .get(&name)
        .ok_or_else(|| CacheError::NotFound(format!("cache '{}'", name)))?;
    delete_from(cache, key).await
}

/// Handler for POST /caches/:name/clear
pub async fn named_clear_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ClearResponse>> {
    let cache = state
        .registry
        .get(&name)
        .ok_or_else(|| CacheError::NotFound(format!("cache '{}'", name)))?;
    cache.clear();
    Ok(Json(ClearResponse::new(name)))
}

/// Handler for GET /caches/:name/stats
pub async fn named_stats_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StatsResponse>> {
    let cache = state
        .registry
        .get(&name)
        .ok_or_else(|| CacheError::NotFound(format!("cache '{}'", name)))?;
    Ok(Json(stats_of(&cache)))
}

/// Handler for POST /caches/:name/optimize
pub async fn named_optimize_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<OptimizeResponse>> {
    let cache = state
        .registry
        .get(&name)
        .ok_or_else(|| CacheError::NotFound(format!("cache '{}'", name)))?;
    let settings = cache.optimize();
    Ok(Json(OptimizeResponse::new(name, &settings)))
}

// == Registry ==

/// Handler for GET /stats/all
pub async fn global_stats_handler(State(state): State<AppState>) -> Json<GlobalStatsResponse> {
    let stats = state
        .registry
        .names()
        .into_iter()
        .filter_map(|name| state.registry.get(&name))
        .map(|cache| (cache.name().to_string(), stats_of(&cache)))
        .collect();
    Json(stats)
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let backing = state.registry.default_cache();
    let backing = backing.backing();
    let status = if !backing.is_configured() {
        "disabled"
    } else if backing.is_available() {
        "available"
    } else {
        "cooling_down"
    };
    Json(HealthResponse::healthy(status))
}
