use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use crate::monitor::Statistics;
use crate::AppState;

// ─── GET /json ───────────────────────────────────────────────────
/// Returns a single JSON snapshot — useful for curl / debugging.

pub async fn get_statistics(State(state): State<Arc<AppState>>) -> Json<Statistics> {
    Json(state.monitor.statistics())
}

// ─── GET /api/statistics/stream ──────────────────────────────────
/// Server-Sent Events endpoint.
/// Pushes the full `Statistics` snapshot as JSON once per second, so a
/// dashboard can follow the distributions without polling.

pub async fn statistics_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let interval = tokio::time::interval(Duration::from_secs(1));

    let stream = IntervalStream::new(interval).map(move |_| {
        let snapshot = state.monitor.statistics();
        let json = serde_json::to_string(&snapshot).unwrap_or_default();
        Ok(Event::default().data(json))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
