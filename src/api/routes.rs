//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, get_handler, global_stats_handler, health_handler, named_clear_handler,
    named_delete_handler, named_get_handler, named_optimize_handler, named_set_handler,
    named_stats_handler, set_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /set` - Store a key-value pair in the default cache
/// - `GET /get/:key` - Retrieve a value from the default cache
/// - `DELETE /del/:key` - Delete a key from the default cache
/// - `GET /stats` - Default cache statistics
/// - `PUT /caches/:name/set`, `GET /caches/:name/get/:key`,
///   `DELETE /caches/:name/del/:key` - Same, on a named cache
/// - `POST /caches/:name/clear` - Empty a named cache and reset its stats
/// - `GET /caches/:name/stats` - Named cache statistics
/// - `POST /caches/:name/optimize` - Run a self-tuning pass now
/// - `GET /stats/all` - Statistics of every cache
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(set_handler))
        .route("/get/:key", get(get_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/stats", get(stats_handler))
        .route("/stats/all", get(global_stats_handler))
        .route("/caches/:name/set", put(named_set_handler))
        .route("/caches/:name/get/:key", get(named_get_handler))
        .route("/caches/:name/del/:key", delete(named_delete_handler))
        .route("/caches/:name/clear", post(named_clear_handler))
        .route("/caches/:name/stats", get(named_stats_handler))
        .route("/caches/:name/optimize", post(named_optimize_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
