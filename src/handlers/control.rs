use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ControlStatus {
    pub running: bool,
    pub message: String,
}

// ─── POST /api/monitor/start ─────────────────────────────────────

pub async fn start_monitor(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // Guard: only one measurement loop at a time
    if state.monitor.is_running() {
        return (
            StatusCode::CONFLICT,
            Json(ControlStatus {
                running: true,
                message: "Monitor already running".into(),
            }),
        );
    }

    state.monitor.start().await;

    (
        StatusCode::OK,
        Json(ControlStatus {
            running: true,
            message: "Monitor started".into(),
        }),
    )
}

// ─── POST /api/monitor/stop ──────────────────────────────────────

pub async fn stop_monitor(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if !state.monitor.is_running() {
        return Json(ControlStatus {
            running: false,
            message: "No monitor is running".into(),
        });
    }

    // Awaits the in-flight iteration (bounded) so the caller knows the
    // loop has actually wound down.
    state.monitor.stop().await;

    Json(ControlStatus {
        running: false,
        message: "Monitor stopped".into(),
    })
}

// ─── GET /api/monitor/status ─────────────────────────────────────

pub async fn monitor_status(State(state): State<Arc<AppState>>) -> Json<ControlStatus> {
    let running = state.monitor.is_running();
    Json(ControlStatus {
        running,
        message: if running {
            "Monitoring in progress".into()
        } else {
            "Idle".into()
        },
    })
}
