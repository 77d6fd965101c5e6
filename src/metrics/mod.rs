pub mod interval;
pub mod percentiles;
pub mod stream;
pub mod timer;

pub use interval::TimingInterval;
pub use percentiles::LatencySummary;
pub use timer::Timer;

use hdrhistogram::Histogram;

// ─── Histogram configuration ─────────────────────────────────────

/// HdrHistogram range: 1 ns → 1 hour, 3 significant figures
/// (relative error ≤ 0.1% across the whole range).
pub const HIST_LOW_NS: u64 = 1;
pub const HIST_HIGH_NS: u64 = 3_600_000_000_000;
pub const HIST_SIGFIG: u8 = 3;

/// Every latency histogram in the system is built with the same bounds,
/// so interval histograms always merge cleanly into the cumulative ones.
pub fn latency_histogram() -> Histogram<u64> {
    Histogram::<u64>::new_with_bounds(HIST_LOW_NS, HIST_HIGH_NS, HIST_SIGFIG)
        .expect("histogram creation")
}
