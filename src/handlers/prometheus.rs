use std::fmt::Write;
use std::sync::Arc;

use axum::{extract::State, http::header, response::IntoResponse};

use crate::monitor::Statistics;
use crate::AppState;

// ─── GET /metrics ────────────────────────────────────────────────
/// Prometheus text exposition of the cumulative statistics.

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = render(&state.monitor.statistics());
    (
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
}

/// Render the whole exposition into one string. Writing into a `String`
/// cannot fail, so the `write!` results are discarded.
pub fn render(stats: &Statistics) -> String {
    let mut out = String::with_capacity(2048);

    let _ = writeln!(
        out,
        "# HELP network_latency_total Total number of latency measurements"
    );
    let _ = writeln!(out, "# TYPE network_latency_total counter");
    let _ = writeln!(out, "network_latency_total {}", stats.total_measurements);

    let _ = writeln!(
        out,
        "# HELP network_latency_successful Successful latency measurements"
    );
    let _ = writeln!(out, "# TYPE network_latency_successful counter");
    let _ = writeln!(
        out,
        "network_latency_successful {}",
        stats.successful_measurements
    );

    let _ = writeln!(
        out,
        "# HELP network_latency_failed Failed latency measurements"
    );
    let _ = writeln!(out, "# TYPE network_latency_failed counter");
    let _ = writeln!(out, "network_latency_failed {}", stats.failed_measurements);

    let _ = writeln!(
        out,
        "# HELP network_latency_uptime_seconds Uptime in seconds"
    );
    let _ = writeln!(out, "# TYPE network_latency_uptime_seconds gauge");
    let _ = writeln!(
        out,
        "network_latency_uptime_seconds {:.1}",
        stats.uptime_ms as f64 / 1000.0
    );

    write_summary(
        &mut out,
        "network_latency_service_time_microseconds",
        "Service time (actual measurement duration)",
        &stats.service_time_us,
        stats.total_measurements,
    );
    write_summary(
        &mut out,
        "network_latency_response_time_microseconds",
        "Response time from intended start (corrects coordinated omission)",
        &stats.response_time_us,
        stats.total_measurements,
    );

    let _ = writeln!(
        out,
        "# HELP network_latency_target_info Target server information"
    );
    let _ = writeln!(out, "# TYPE network_latency_target_info gauge");
    let _ = writeln!(
        out,
        "network_latency_target_info{{host=\"{}\",port=\"{}\"}} 1",
        stats.target_host, stats.target_port
    );

    out
}

fn write_summary(
    out: &mut String,
    name: &str,
    help: &str,
    summary: &crate::metrics::LatencySummary,
    count: u64,
) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} summary");
    let quantiles = [
        ("0", summary.min_us),
        ("0.5", summary.p50_us),
        ("0.95", summary.p95_us),
        ("0.99", summary.p99_us),
        ("0.999", summary.p999_us),
        ("1", summary.max_us),
    ];
    for (quantile, value) in quantiles {
        let _ = writeln!(out, "{name}{{quantile=\"{quantile}\"}} {value:.1}");
    }
    let _ = writeln!(out, "{name}_sum {:.1}", summary.mean_us * count as f64);
    let _ = writeln!(out, "{name}_count {count}");
}
