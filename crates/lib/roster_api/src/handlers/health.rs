//! Health check endpoint.

use axum::Json;
use axum::extract::State;
use tracing::warn;

use crate::AppState;
use crate::models::HealthResponse;

/// `GET /api/health` — version and store reachability.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_connected = state.store.ping().await;
    if !store_connected {
        warn!("credential store unreachable");
    }
    let status = if store_connected { "ok" } else { "degraded" };
    Json(HealthResponse {
        status: status.to_string(),
        version: roster_core::version().to_string(),
        store_connected,
    })
}
