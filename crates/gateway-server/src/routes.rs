//! Route definitions for the gateway API.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{handlers, state::AppState};

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health and service info
        .route("/health", get(handlers::health_check))
        .route("/api", get(handlers::api_info))
        // Metrics endpoint
        .route("/metrics", get(handlers::metrics_endpoint))
        // APOD endpoints
        .nest("/apod", apod_routes())
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// APOD lookup and cache administration routes
fn apod_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_apod))
        .route("/info", get(handlers::apod_info))
        .route("/cache/info", get(handlers::cache_info))
        .route("/cache/clear", delete(handlers::clear_cache))
        .route("/cache/config", put(handlers::update_cache_config))
        .route("/rate-limit/reset", post(handlers::reset_rate_limit))
        .route("/:date", get(handlers::get_apod_by_date))
}
