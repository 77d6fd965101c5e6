use std::mem;
use std::time::Instant;

use hdrhistogram::Histogram;
use parking_lot::Mutex;

use super::{latency_histogram, TimingInterval};

// ─── Timing recorder ─────────────────────────────────────────────

/// Records per-probe timings into two HdrHistograms:
///
///   service time  — stop instant minus the probe's *actual* start
///   response time — stop instant minus the probe's *intended* start
///
/// The gap between the two series is exactly the scheduling delay a paced
/// caller accumulated before the probe got to run.
///
/// One task calls `mark_expected_start` / `start` / `stop` in sequence;
/// any thread may call `snapshot` to drain the current window. All window
/// state sits behind a single mutex held only for the O(1) record or the
/// histogram swap — never across a probe or a sleep — so a snapshot request
/// can never stall the recording side and every sample lands in exactly
/// one interval.
pub struct Timer {
    inner: Mutex<Window>,
}

struct Window {
    // In-progress measurement stamps
    expected_start: Option<Instant>,
    sample_start: Option<Instant>,

    // Actively written histograms, swapped out wholesale on snapshot
    service_times: Histogram<u64>,
    response_times: Histogram<u64>,

    // Window bookkeeping
    op_count: u64,
    last_snapshot: Instant,
    up_to_date_as_of: Instant,
}

impl Timer {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            inner: Mutex::new(Window {
                expected_start: None,
                sample_start: None,
                service_times: latency_histogram(),
                response_times: latency_histogram(),
                op_count: 0,
                last_snapshot: now,
                up_to_date_as_of: now,
            }),
        }
    }

    /// Stamp the intended start of the next measurement. Must be called
    /// before the pacing wait — the whole point is to capture the schedule,
    /// not the moment the caller finally got going.
    pub fn mark_expected_start(&self, at: Instant) {
        self.inner.lock().expected_start = Some(at);
    }

    /// Stamp the actual start of the measurement.
    pub fn start(&self) {
        self.start_at(Instant::now());
    }

    pub fn start_at(&self, at: Instant) {
        self.inner.lock().sample_start = Some(at);
    }

    /// Record one finished measurement into both series.
    pub fn stop(&self) {
        self.stop_at(Instant::now());
    }

    pub fn stop_at(&self, now: Instant) {
        let mut window = self.inner.lock();

        let actual_start = window.sample_start.take().unwrap_or(now);
        // Without a schedule stamp the response time degrades to the
        // service time.
        let expected_start = window.expected_start.take().unwrap_or(actual_start);

        let service_ns = nanos_between(actual_start, now);
        // expected ≤ actual ≤ now by construction; the clamp guards the
        // invariant against stamps supplied out of order.
        let response_ns = nanos_between(expected_start, now).max(service_ns);

        window.service_times.saturating_record(service_ns);
        window.response_times.saturating_record(response_ns);
        window.op_count += 1;
        window.up_to_date_as_of = now;
    }

    /// Drain the current window into an immutable interval and start a
    /// fresh one. Safe to call from any thread, any number of times.
    pub fn snapshot(&self) -> TimingInterval {
        // Build the replacement histograms before taking the lock so the
        // recording side is only ever blocked for the swap itself.
        let fresh_service = latency_histogram();
        let fresh_response = latency_histogram();

        let mut window = self.inner.lock();
        let start = window.last_snapshot;
        let end = window.up_to_date_as_of;
        let service = mem::replace(&mut window.service_times, fresh_service);
        let response = mem::replace(&mut window.response_times, fresh_response);
        let op_count = mem::take(&mut window.op_count);
        window.last_snapshot = end;
        drop(window);

        TimingInterval::new(start, end, op_count, response, service)
    }

    /// Final drain when the measurement loop exits. The timer is not
    /// expected to record again afterwards.
    pub fn close(&self) -> TimingInterval {
        self.snapshot()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

fn nanos_between(earlier: Instant, later: Instant) -> u64 {
    let ns = later.saturating_duration_since(earlier).as_nanos() as u64;
    // Histogram low bound is 1 ns.
    ns.max(1)
}

// ─── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn response_time_covers_scheduling_delay() {
        let timer = Timer::new();
        let t0 = Instant::now();

        // Intended at t0, actually started 5 ms late, ran for 4 ms.
        timer.mark_expected_start(t0);
        timer.start_at(t0 + Duration::from_millis(5));
        timer.stop_at(t0 + Duration::from_millis(9));

        let interval = timer.snapshot();
        assert_eq!(interval.operation_count(), 1);

        let service = interval.service_summary();
        let response = interval.response_summary();
        assert!((service.max_us - 4_000.0).abs() < 10.0, "{}", service.max_us);
        assert!((response.max_us - 9_000.0).abs() < 10.0, "{}", response.max_us);
    }

    #[test]
    fn response_equals_service_when_started_on_time() {
        let timer = Timer::new();
        let t0 = Instant::now();

        timer.mark_expected_start(t0);
        timer.start_at(t0);
        timer.stop_at(t0 + Duration::from_millis(3));

        let interval = timer.snapshot();
        assert_eq!(
            interval.service_times().max(),
            interval.response_times().max()
        );
    }

    #[test]
    fn response_never_below_service() {
        let timer = Timer::new();
        let t0 = Instant::now();

        // Stamps out of order: the schedule claims a start *after* the
        // probe actually began. The clamp keeps the invariant.
        timer.mark_expected_start(t0 + Duration::from_millis(2));
        timer.start_at(t0);
        timer.stop_at(t0 + Duration::from_millis(4));

        let interval = timer.snapshot();
        assert!(interval.response_times().max() >= interval.service_times().max());
    }

    #[test]
    fn missing_schedule_stamp_degrades_to_service_time() {
        let timer = Timer::new();
        let t0 = Instant::now();

        timer.start_at(t0);
        timer.stop_at(t0 + Duration::from_millis(2));

        let interval = timer.snapshot();
        assert_eq!(
            interval.service_times().max(),
            interval.response_times().max()
        );
    }

    #[test]
    fn snapshot_drains_the_window() {
        let timer = Timer::new();
        let t0 = Instant::now();

        for i in 0..3u64 {
            let start = t0 + Duration::from_millis(i * 10);
            timer.mark_expected_start(start);
            timer.start_at(start);
            timer.stop_at(start + Duration::from_millis(1));
        }

        let first = timer.snapshot();
        assert_eq!(first.operation_count(), 3);
        assert_eq!(first.service_times().len(), 3);

        // Nothing recorded since: empty, zero-length window.
        let second = timer.snapshot();
        assert_eq!(second.operation_count(), 0);
        assert_eq!(second.service_times().len(), 0);
        assert_eq!(second.op_rate(), 0.0);
    }

    #[test]
    fn consecutive_windows_share_boundaries() {
        let timer = Timer::new();
        let t0 = Instant::now();

        timer.stop_at(t0 + Duration::from_millis(10));
        let _first = timer.snapshot();

        // The next window begins where the previous one ended.
        timer.stop_at(t0 + Duration::from_millis(25));
        let second = timer.snapshot();
        assert_eq!(second.run_time(), Duration::from_millis(15));
    }

    #[test]
    fn no_sample_lost_or_double_counted_under_concurrent_snapshots() {
        const OPS: u64 = 10_000;

        let timer = Arc::new(Timer::new());
        let t0 = Instant::now();

        let producer = {
            let timer = Arc::clone(&timer);
            std::thread::spawn(move || {
                for i in 0..OPS {
                    let start = t0 + Duration::from_micros(i);
                    timer.mark_expected_start(start);
                    timer.start_at(start);
                    timer.stop_at(start + Duration::from_micros(50));
                }
            })
        };

        // Snapshot aggressively while the producer is writing.
        let mut total_ops = 0u64;
        let mut total_recorded = 0u64;
        while !producer.is_finished() {
            let interval = timer.snapshot();
            total_ops += interval.operation_count();
            total_recorded += interval.service_times().len();
        }
        producer.join().expect("producer panicked");

        let last = timer.close();
        total_ops += last.operation_count();
        total_recorded += last.service_times().len();

        assert_eq!(total_ops, OPS);
        assert_eq!(total_recorded, OPS);
    }
}
