use std::fmt::Write;
use std::sync::Arc;

use axum::{extract::State, response::Html};

use crate::monitor::Statistics;
use crate::AppState;

// ─── GET / ───────────────────────────────────────────────────────
/// Self-refreshing HTML dashboard. Server-rendered on every request from
/// the same statistics snapshot the machine-readable endpoints use.

pub async fn dashboard(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render(&state.monitor.statistics()))
}

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html><head>
<title>Network Latency Monitor</title>
<meta http-equiv='refresh' content='5'>
<style>
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
       max-width: 900px; margin: 40px auto; padding: 20px; background: #0d1117; color: #c9d1d9; }
h1 { color: #58a6ff; border-bottom: 1px solid #30363d; padding-bottom: 10px; }
h2 { color: #8b949e; margin-top: 30px; }
.stats { background: #161b22; border-radius: 6px; padding: 20px; margin: 20px 0; }
.stat-row { display: flex; justify-content: space-between; padding: 8px 0; border-bottom: 1px solid #21262d; }
.stat-label { color: #8b949e; }
.stat-value { color: #58a6ff; font-family: monospace; }
.good { color: #3fb950; }
.warn { color: #d29922; }
.error { color: #f85149; }
table { width: 100%; border-collapse: collapse; margin: 10px 0; }
th, td { padding: 10px; text-align: right; border-bottom: 1px solid #21262d; }
th { color: #8b949e; font-weight: normal; }
td { font-family: monospace; color: #58a6ff; }
th:first-child, td:first-child { text-align: left; }
.info-box { background: #1f6feb20; border: 1px solid #1f6feb; border-radius: 6px; padding: 15px; margin: 20px 0; }
</style></head><body>
<h1>Network Latency Monitor</h1>
"#;

pub fn render(stats: &Statistics) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(PAGE_HEAD);

    // ── Target info ─────────────────────────────────────────────
    let (status_class, status_text) = if stats.running {
        ("good", "Running")
    } else {
        ("error", "Stopped")
    };
    let _ = write!(
        out,
        "<div class='stats'>\
         {}{}\
         <div class='stat-row'><span class='stat-label'>Status</span>\
         <span class='stat-value {status_class}'>{status_text}</span></div>\
         {}\
         </div>\n",
        stat_row(
            "Target",
            &format!("{}:{}", stats.target_host, stats.target_port)
        ),
        stat_row(
            "Measurement Rate",
            &format!("{:.0} probes/second", stats.rate_per_second)
        ),
        stat_row("Uptime", &format_duration(stats.uptime_ms)),
    );

    // ── Measurement counts ──────────────────────────────────────
    let error_class = if stats.error_rate_pct > 1.0 {
        "error"
    } else if stats.error_rate_pct > 0.0 {
        "warn"
    } else {
        "good"
    };
    let failed_class = if stats.failed_measurements > 0 {
        "error"
    } else {
        ""
    };
    let _ = write!(
        out,
        "<h2>Measurements</h2>\n<div class='stats'>\
         {}\
         <div class='stat-row'><span class='stat-label'>Successful</span>\
         <span class='stat-value good'>{}</span></div>\
         <div class='stat-row'><span class='stat-label'>Failed</span>\
         <span class='stat-value {failed_class}'>{}</span></div>\
         <div class='stat-row'><span class='stat-label'>Error Rate</span>\
         <span class='stat-value {error_class}'>{:.2}%</span></div>\
         </div>\n",
        stat_row("Total", &stats.total_measurements.to_string()),
        stats.successful_measurements,
        stats.failed_measurements,
        stats.error_rate_pct,
    );

    // ── Latency table ───────────────────────────────────────────
    let service = &stats.service_time_us;
    let response = &stats.response_time_us;
    let _ = write!(
        out,
        "<h2>Latency (microseconds)</h2>\n<table>\n\
         <tr><th>Metric</th><th>Service Time</th><th>Response Time*</th></tr>\n"
    );
    let rows = [
        ("Mean", service.mean_us, response.mean_us),
        ("Median (p50)", service.p50_us, response.p50_us),
        ("p95", service.p95_us, response.p95_us),
        ("p99", service.p99_us, response.p99_us),
        ("p99.9", service.p999_us, response.p999_us),
        ("Max", service.max_us, response.max_us),
        ("Min", service.min_us, response.min_us),
    ];
    for (label, service_us, response_us) in rows {
        let _ = writeln!(
            out,
            "<tr><td>{label}</td><td>{service_us:.1}</td><td>{response_us:.1}</td></tr>"
        );
    }
    out.push_str("</table>\n");

    out.push_str(
        "<div class='info-box'>\
         <strong>* Coordinated Omission Correction</strong><br>\
         <small>Service Time = actual measurement duration | \
         Response Time = time from intended start (includes scheduling delays)</small>\
         </div>\n",
    );

    // ── Endpoint index ──────────────────────────────────────────
    out.push_str(
        "<h2>Endpoints</h2>\n<div class='stats'>\
         <div class='stat-row'><span class='stat-label'><a href='/metrics' style='color:#58a6ff'>/metrics</a></span><span class='stat-value'>Prometheus format</span></div>\
         <div class='stat-row'><span class='stat-label'><a href='/health' style='color:#58a6ff'>/health</a></span><span class='stat-value'>Health check</span></div>\
         <div class='stat-row'><span class='stat-label'><a href='/json' style='color:#58a6ff'>/json</a></span><span class='stat-value'>JSON format</span></div>\
         </div>\n",
    );

    out.push_str(
        "<p style='color:#484f58;text-align:center;margin-top:40px;'>Auto-refreshing every 5 seconds</p>\n</body></html>\n",
    );
    out
}

fn stat_row(label: &str, value: &str) -> String {
    format!(
        "<div class='stat-row'><span class='stat-label'>{label}</span>\
         <span class='stat-value'>{value}</span></div>"
    )
}

fn format_duration(ms: u64) -> String {
    let seconds = ms / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{}d {}h {}m", days, hours % 24, minutes % 60)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes % 60, seconds % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds % 60)
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::LatencySummary;

    #[test]
    fn format_duration_picks_the_right_unit() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(42_000), "42s");
        assert_eq!(format_duration(65_000), "1m 5s");
        assert_eq!(format_duration(3_725_000), "1h 2m 5s");
        assert_eq!(format_duration(90_061_000 + 86_400_000), "2d 1h 1m");
    }

    #[test]
    fn page_shows_target_and_both_series() {
        let stats = Statistics {
            target_host: "example.com".into(),
            target_port: 443,
            rate_per_second: 10.0,
            running: true,
            started_at: None,
            uptime_ms: 65_000,
            total_measurements: 650,
            successful_measurements: 650,
            failed_measurements: 0,
            error_rate_pct: 0.0,
            service_time_us: LatencySummary {
                mean_us: 123.4,
                p50_us: 120.0,
                p95_us: 200.0,
                p99_us: 250.0,
                p999_us: 300.0,
                max_us: 400.0,
                min_us: 90.0,
            },
            response_time_us: LatencySummary::empty(),
        };

        let page = render(&stats);
        assert!(page.contains("example.com:443"));
        assert!(page.contains("Running"));
        assert!(page.contains("1m 5s"));
        assert!(page.contains("Service Time"));
        assert!(page.contains("Response Time*"));
        assert!(page.contains("120.0"));
    }
}
