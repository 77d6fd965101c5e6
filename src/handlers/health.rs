use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::AppState;

// ─── GET /health ─────────────────────────────────────────────────
/// Liveness derived solely from the measurement loop's running flag.

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.monitor.is_running() {
        (StatusCode::OK, "Healthy\n")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Unhealthy\n")
    }
}
