use std::time::{Duration, Instant};

use hdrhistogram::Histogram;

use super::{latency_histogram, LatencySummary};

/// Metrics drained from a [`Timer`](super::Timer) for one reporting window.
///
/// Immutable once built. Consumed exactly once by the fold that merges it
/// into the cumulative histograms, then dropped.
pub struct TimingInterval {
    start: Instant,
    end: Instant,
    operation_count: u64,
    response_times: Histogram<u64>,
    service_times: Histogram<u64>,
}

impl TimingInterval {
    pub fn new(
        start: Instant,
        end: Instant,
        operation_count: u64,
        response_times: Histogram<u64>,
        service_times: Histogram<u64>,
    ) -> Self {
        Self {
            start,
            end: end.max(start),
            operation_count,
            response_times,
            service_times,
        }
    }

    /// A zero-length window with no samples.
    pub fn empty(at: Instant) -> Self {
        Self::new(at, at, 0, latency_histogram(), latency_histogram())
    }

    pub fn operation_count(&self) -> u64 {
        self.operation_count
    }

    pub fn run_time(&self) -> Duration {
        self.end - self.start
    }

    /// Operations per second over the window; 0 for a zero-length window.
    pub fn op_rate(&self) -> f64 {
        let duration = self.end - self.start;
        if duration.is_zero() {
            return 0.0;
        }
        self.operation_count as f64 / duration.as_secs_f64()
    }

    pub fn response_times(&self) -> &Histogram<u64> {
        &self.response_times
    }

    pub fn service_times(&self) -> &Histogram<u64> {
        &self.service_times
    }

    pub fn response_summary(&self) -> LatencySummary {
        LatencySummary::from_nanos(&self.response_times)
    }

    pub fn service_summary(&self) -> LatencySummary {
        LatencySummary::from_nanos(&self.service_times)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_rate_is_zero_for_zero_length_window() {
        let interval = TimingInterval::empty(Instant::now());
        assert_eq!(interval.op_rate(), 0.0);
        assert_eq!(interval.operation_count(), 0);
        assert_eq!(interval.run_time(), Duration::ZERO);
    }

    #[test]
    fn op_rate_is_count_over_window_seconds() {
        let t0 = Instant::now();
        let interval = TimingInterval::new(
            t0,
            t0 + Duration::from_secs(2),
            100,
            latency_histogram(),
            latency_histogram(),
        );
        assert!((interval.op_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn end_is_clamped_to_start() {
        let t0 = Instant::now();
        let interval = TimingInterval::new(
            t0 + Duration::from_secs(1),
            t0,
            5,
            latency_histogram(),
            latency_histogram(),
        );
        assert_eq!(interval.run_time(), Duration::ZERO);
        assert_eq!(interval.op_rate(), 0.0);
    }

    #[test]
    fn summaries_reflect_recorded_samples() {
        let mut response = latency_histogram();
        let mut service = latency_histogram();
        service.saturating_record(2_000_000); // 2 ms actually measuring
        response.saturating_record(7_000_000); // 7 ms from intended start

        let t0 = Instant::now();
        let interval =
            TimingInterval::new(t0, t0 + Duration::from_secs(1), 1, response, service);

        assert!(interval.response_summary().p50_us > interval.service_summary().p50_us);
    }

    #[test]
    fn folding_intervals_matches_direct_recording() {
        // The same samples split across five interval histograms and merged
        // must estimate the same percentiles as one histogram fed directly.
        let mut direct = latency_histogram();
        let mut cumulative = latency_histogram();

        for chunk in 0..5u64 {
            let mut response = latency_histogram();
            let service = latency_histogram();
            for i in 0..200u64 {
                let value_ns = 1_000_000 + chunk * 350_000 + i * 9_000;
                response.saturating_record(value_ns);
                direct.saturating_record(value_ns);
            }
            let t0 = Instant::now();
            let interval =
                TimingInterval::new(t0, t0 + Duration::from_secs(1), 200, response, service);
            cumulative
                .add(interval.response_times())
                .expect("identical bounds");
        }

        assert_eq!(cumulative.len(), direct.len());
        for pct in [50.0, 95.0, 99.0, 99.9] {
            assert_eq!(
                cumulative.value_at_percentile(pct),
                direct.value_at_percentile(pct),
                "percentile {pct}"
            );
        }
    }
}
