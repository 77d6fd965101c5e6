use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::metrics::stream;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Human-facing dashboard ──────────────────────────────
        .route("/", get(handlers::dashboard::dashboard))
        // ── Machine-readable statistics ─────────────────────────
        .route("/metrics", get(handlers::prometheus::metrics))
        .route("/json", get(stream::get_statistics))
        .route("/health", get(handlers::health::health))
        .route("/api/statistics/stream", get(stream::statistics_stream))
        // ── Monitor control ─────────────────────────────────────
        .route("/api/monitor/start", post(handlers::control::start_monitor))
        .route("/api/monitor/stop", post(handlers::control::stop_monitor))
        .route("/api/monitor/status", get(handlers::control::monitor_status))
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(CorsLayer::permissive())
}
