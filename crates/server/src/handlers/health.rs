//! Health endpoint.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use cachecow_core::config::ServerRole;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub role: ServerRole,
}

/// GET /_cachecow/health - Health check.
///
/// Unauthenticated for load balancer probes. Both stores must answer their
/// health checks; the secret store is not consulted.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state
        .source
        .health_check()
        .await
        .map_err(|e| ApiError::Internal(format!("source store unhealthy: {e}")))?;
    state
        .cache
        .health_check()
        .await
        .map_err(|e| ApiError::Internal(format!("cache store unhealthy: {e}")))?;

    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        role: state.config.server.role,
    }))
}
