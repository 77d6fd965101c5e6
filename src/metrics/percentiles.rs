use hdrhistogram::Histogram;
use serde::Serialize;

/// A complete percentile breakdown for one latency series, in microseconds.
/// Serialized straight into the JSON snapshot and the SSE stream.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LatencySummary {
    pub mean_us: f64,
    pub p50_us: f64,
    pub p95_us: f64,
    pub p99_us: f64,
    pub p999_us: f64,
    pub max_us: f64,
    pub min_us: f64,
}

impl LatencySummary {
    /// Extract a full summary from a nanosecond-valued HdrHistogram.
    /// Returns zeroed values if the histogram is empty.
    pub fn from_nanos(hist: &Histogram<u64>) -> Self {
        if hist.len() == 0 {
            return Self::empty();
        }

        Self {
            mean_us: hist.mean() / 1_000.0,
            p50_us: hist.value_at_percentile(50.0) as f64 / 1_000.0,
            p95_us: hist.value_at_percentile(95.0) as f64 / 1_000.0,
            p99_us: hist.value_at_percentile(99.0) as f64 / 1_000.0,
            p999_us: hist.value_at_percentile(99.9) as f64 / 1_000.0,
            max_us: hist.max() as f64 / 1_000.0,
            min_us: hist.min() as f64 / 1_000.0,
        }
    }

    /// All-zero placeholder used before any samples are recorded.
    pub fn empty() -> Self {
        Self {
            mean_us: 0.0,
            p50_us: 0.0,
            p95_us: 0.0,
            p99_us: 0.0,
            p999_us: 0.0,
            max_us: 0.0,
            min_us: 0.0,
        }
    }
}
