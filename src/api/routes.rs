//! API Routes
//!
//! Configures the Axum router with all admin endpoints.

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, health_handler, info_handler, invalidate_domain_handler,
    invalidate_pattern_handler, metrics_handler, update_config_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /metrics` - Counter snapshot
/// - `GET /info` - Entry count, memory estimate, oldest/newest keys
/// - `POST /invalidate` - Invalidate keys matching a pattern
/// - `POST /invalidate/:domain` - Run a named domain invalidation
/// - `DELETE /clear` - Empty the cache and reset metrics
/// - `PATCH /config` - Merge a partial configuration
///
/// # Middleware
/// - CORS: Allows any origin (dashboards are served elsewhere)
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/info", get(info_handler))
        .route("/invalidate", post(invalidate_pattern_handler))
        .route("/invalidate/:domain", post(invalidate_domain_handler))
        .route("/clear", delete(clear_handler))
        .route("/config", patch(update_config_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
