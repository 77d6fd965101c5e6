use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use hdrhistogram::Histogram;
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::Serialize;

use crate::metrics::{latency_histogram, LatencySummary, Timer, TimingInterval};
use crate::pacing::Pacer;
use crate::probe::TcpProber;

/// How long `stop()` waits for the in-flight iteration before detaching.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

// ─── Monitor ─────────────────────────────────────────────────────

/// Owns the single measurement task and the cumulative statistics it feeds.
///
/// Exactly one task paces, probes, times, and folds; any number of HTTP
/// handlers read `statistics()` concurrently. Both sides go through one
/// short-held mutex around the cumulative state — never held across a
/// probe or a pacing sleep.
pub struct LatencyMonitor {
    probe: TcpProber,
    rate_per_second: f64,
    catch_up_rate_multiple: f64,
    running: Arc<AtomicBool>,
    stats: Arc<Mutex<CumulativeStats>>,

    /// Handle to the spawned measurement task so `stop` can await a clean
    /// shutdown.
    handle: tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

struct CumulativeStats {
    service_times: Histogram<u64>,
    response_times: Histogram<u64>,
    total: u64,
    successful: u64,
    failed: u64,
    started: Option<Instant>,
    started_at: Option<DateTime<Utc>>,
}

/// Read-only snapshot consumed by every reporting endpoint.
///
/// Built in O(1) histogram accessor calls under a single lock acquisition,
/// so all fields reflect the same cumulative state.
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub target_host: String,
    pub target_port: u16,
    pub rate_per_second: f64,
    pub running: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub uptime_ms: u64,
    pub total_measurements: u64,
    pub successful_measurements: u64,
    pub failed_measurements: u64,
    pub error_rate_pct: f64,
    pub service_time_us: LatencySummary,
    pub response_time_us: LatencySummary,
}

impl LatencyMonitor {
    pub fn new(probe: TcpProber, rate_per_second: f64, catch_up_rate_multiple: f64) -> Self {
        Self {
            probe,
            rate_per_second,
            catch_up_rate_multiple,
            running: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(Mutex::new(CumulativeStats::new())),
            handle: tokio::sync::Mutex::new(None),
        }
    }

    /// Spawn the measurement task. No-op if already running.
    pub async fn start(&self) {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        self.stats.lock().mark_started();

        let running = self.running.clone();
        let stats = self.stats.clone();
        let probe = self.probe.clone();
        let rate = self.rate_per_second;
        let catch_up = self.catch_up_rate_multiple;

        let handle = tokio::spawn(async move {
            measurement_loop(running, stats, probe, rate, catch_up).await;
        });
        *self.handle.lock().await = Some(handle);

        info!(
            "started latency monitoring of {} at {} probes/sec",
            self.probe.target(),
            self.rate_per_second
        );
    }

    /// Signal the measurement task to stop and wait (bounded) for the
    /// in-flight iteration to finish. No-op if not running.
    pub async fn stop(&self) {
        if self
            .running
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let mut guard = self.handle.lock().await;
        if let Some(handle) = guard.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
                warn!(
                    "measurement task did not stop within {:?}; detaching",
                    SHUTDOWN_GRACE
                );
            }
        }

        info!("stopped latency monitoring of {}", self.probe.target());
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// A consistent snapshot of the cumulative state.
    pub fn statistics(&self) -> Statistics {
        let stats = self.stats.lock();
        stats.snapshot(
            self.probe.host(),
            self.probe.port(),
            self.rate_per_second,
            self.is_running(),
        )
    }
}

// ─── Measurement loop ────────────────────────────────────────────

async fn measurement_loop(
    running: Arc<AtomicBool>,
    stats: Arc<Mutex<CumulativeStats>>,
    probe: TcpProber,
    rate_per_second: f64,
    catch_up_rate_multiple: f64,
) {
    let mut pacer = Pacer::with_catch_up_rate(rate_per_second, catch_up_rate_multiple);
    pacer.set_initial_start(Instant::now());
    let timer = Timer::new();

    while running.load(Ordering::Relaxed) {
        // Stamp the intended start before waiting: the response-time series
        // must measure from the schedule, not from whenever we woke up.
        timer.mark_expected_start(pacer.expected_start_time());

        pacer.acquire().await;

        timer.start();
        let outcome = probe.attempt().await;
        timer.stop();

        if let Some(error) = &outcome.error {
            debug!("probe of {} failed: {}", probe.target(), error);
        }

        let interval = timer.snapshot();
        {
            let mut cumulative = stats.lock();
            cumulative.record_outcome(outcome.success);
            cumulative.fold(&interval);
        }
    }

    // Drain whatever the last window still holds.
    let last = timer.close();
    stats.lock().fold(&last);

    debug!(
        "measurement loop exiting after {} paced units ({:.1} ops/sec over the last window)",
        pacer.units_completed(),
        last.op_rate()
    );
}

// ─── Cumulative state ────────────────────────────────────────────

impl CumulativeStats {
    fn new() -> Self {
        Self {
            service_times: latency_histogram(),
            response_times: latency_histogram(),
            total: 0,
            successful: 0,
            failed: 0,
            started: None,
            started_at: None,
        }
    }

    fn mark_started(&mut self) {
        self.started = Some(Instant::now());
        self.started_at = Some(Utc::now());
    }

    fn record_outcome(&mut self, success: bool) {
        self.total += 1;
        if success {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Merge one drained interval into the all-time histograms.
    fn fold(&mut self, interval: &TimingInterval) {
        // Identical bounds on every histogram; add cannot fail.
        self.service_times
            .add(interval.service_times())
            .expect("histogram bounds match");
        self.response_times
            .add(interval.response_times())
            .expect("histogram bounds match");
    }

    fn snapshot(&self, host: &str, port: u16, rate_per_second: f64, running: bool) -> Statistics {
        Statistics {
            target_host: host.to_owned(),
            target_port: port,
            rate_per_second,
            running,
            started_at: self.started_at,
            uptime_ms: self
                .started
                .map(|t| t.elapsed().as_millis() as u64)
                .unwrap_or(0),
            total_measurements: self.total,
            successful_measurements: self.successful,
            failed_measurements: self.failed,
            error_rate_pct: error_rate(self.failed, self.total),
            service_time_us: LatencySummary::from_nanos(&self.service_times),
            response_time_us: LatencySummary::from_nanos(&self.response_times),
        }
    }
}

/// Failed measurements as a percentage of all measurements; 0 when nothing
/// has been measured yet.
fn error_rate(failed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    failed as f64 * 100.0 / total as f64
}

// ─── Tests ───────────────────────────────────────────────────────
