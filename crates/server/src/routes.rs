//! Route configuration.

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use crate::trace::trace_id_middleware;
use axum::Router;
use axum::middleware;
use axum::routing::get;
use cachecow_core::config::ServerRole;
use tower_http::trace::TraceLayer;

/// Prefix for internal endpoints, kept out of the asset namespace.
pub const INTERNAL_PREFIX: &str = "/_cachecow";

/// Create the application router.
///
/// Internal endpoints are matched first. Every other path is an asset request,
/// handled by the fallback for the configured role.
pub fn create_router(state: AppState) -> Router {
    let mut router =
        Router::new().route(&format!("{INTERNAL_PREFIX}/health"), get(handlers::health_check));

    // When enabled, this endpoint must be network-restricted to the scrapers.
    if state.config.server.metrics_enabled {
        router = router.route(&format!("{INTERNAL_PREFIX}/metrics"), get(metrics_handler));
    }

    router = match state.config.server.role {
        ServerRole::Transform => router.fallback(handlers::transform_fallback),
        ServerRole::Edge => router.fallback(handlers::edge_fallback),
    };

    // Layers run outermost first: TraceLayer -> trace id -> handler.
    router
        .layer(middleware::from_fn(trace_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
