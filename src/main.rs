use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{error, info};

mod config;
mod handlers;
mod metrics;
mod middleware;
mod monitor;
mod pacing;
mod probe;
mod server;

use config::Config;
use monitor::LatencyMonitor;
use probe::TcpProber;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// The measurement engine — one paced probe loop plus cumulative stats.
    pub monitor: Arc<LatencyMonitor>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    if let Err(message) = config.validate() {
        error!("invalid configuration: {message}");
        std::process::exit(1);
    }

    info!("=== Network Latency Monitor ===");
    info!("Target: {}:{}", config.target_host, config.target_port);
    info!("Rate: {} probes/second", config.rate_per_second);
    info!("Server port: {}", config.server_port);

    // ── 1. Build & start the measurement engine ──────────────────
    let probe = TcpProber::new(
        config.target_host.clone(),
        config.target_port,
        config.probe_timeout(),
    );
    let monitor = Arc::new(LatencyMonitor::new(
        probe,
        config.rate_per_second,
        config.catch_up_rate_multiple,
    ));
    monitor.start().await;

    // ── 2. Build shared state & router ───────────────────────────
    let state = Arc::new(AppState {
        monitor: monitor.clone(),
    });
    let app = server::create_router(state);

    // ── 3. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.server_port))
        .await
        .unwrap_or_else(|e| {
            error!("cannot bind port {}: {e}", config.server_port);
            std::process::exit(1);
        });

    info!("Dashboard: http://localhost:{}/", config.server_port);
    info!("Metrics:   http://localhost:{}/metrics", config.server_port);
    info!("Health:    http://localhost:{}/health", config.server_port);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(monitor))
        .await
    {
        error!("server exited with error: {e}");
        std::process::exit(1);
    }
}

/// Resolves on Ctrl-C / SIGTERM-equivalent, stopping the measurement loop
/// before axum drains its connections.
async fn shutdown_signal(monitor: Arc<LatencyMonitor>) {
    if tokio::signal::ctrl_c().await.is_err() {
        // If the signal handler cannot be installed we still want a
        // functioning server; park this future instead of shutting down.
        std::future::pending::<()>().await;
    }
    info!("shutting down...");
    monitor.stop().await;
    // Give in-flight scrapes a beat to finish before the process exits.
    tokio::time::sleep(Duration::from_millis(100)).await;
}
