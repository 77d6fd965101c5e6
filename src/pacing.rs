use std::time::{Duration, Instant};

// ─── Rate controller ─────────────────────────────────────────────

/// Paces the measurement loop at a fixed target rate.
///
/// Intended start times are pre-computed from a fixed origin:
/// `initial_start + n / throughput`. They never shift when the caller
/// runs late, which is what makes response-time measurement (and the
/// coordinated-omission correction built on it) meaningful.
///
/// When the caller falls behind schedule the pacer releases units at a
/// bounded multiple of the nominal rate until it has caught up, anchored
/// at the instant it first fell behind. Unbounded bursting would distort
/// the very measurements we are trying to protect.
pub struct Pacer {
    initial_start: Instant,
    throughput_per_nsec: f64,
    units_completed: u64,

    // Catch-up state
    caught_up: bool,
    catch_up_start: Instant,
    units_completed_at_catch_up_start: u64,
    catch_up_rate_multiple: f64,
}

impl Pacer {
    /// Default: catch up at 3x the nominal rate.
    pub fn new(units_per_sec: f64) -> Self {
        Self::with_catch_up_rate(units_per_sec, 3.0)
    }

    pub fn with_catch_up_rate(units_per_sec: f64, catch_up_rate_multiple: f64) -> Self {
        let now = Instant::now();
        Self {
            initial_start: now,
            throughput_per_nsec: units_per_sec / 1_000_000_000.0,
            units_completed: 0,
            caught_up: true,
            catch_up_start: now,
            units_completed_at_catch_up_start: 0,
            catch_up_rate_multiple,
        }
    }

    /// Re-anchor the schedule. Call before the first `acquire`.
    pub fn set_initial_start(&mut self, at: Instant) {
        self.initial_start = at;
    }

    /// The intended start instant of the next unit.
    ///
    /// Deterministic in `units_completed` — it does not look at the clock.
    /// Callers stamp this *before* waiting so the recorded response time
    /// covers any scheduling delay.
    pub fn expected_start_time(&self) -> Instant {
        self.expected_start_for(self.units_completed)
    }

    fn expected_start_for(&self, units: u64) -> Instant {
        self.initial_start + Duration::from_nanos((units as f64 / self.throughput_per_nsec) as u64)
    }

    /// How long to wait before releasing the next unit, or `None` to send
    /// immediately. Mutates the catch-up state on the caught-up → behind
    /// transition.
    fn delay_until_next_send(&mut self, now: Instant) -> Option<Duration> {
        let next_start = self.expected_start_time();

        if next_start > now {
            // On pace.
            self.caught_up = true;
            return Some(next_start - now);
        }

        // Behind schedule.
        if self.caught_up {
            // First fall-behind since last caught up: this instant becomes
            // the catch-up origin.
            self.caught_up = false;
            self.catch_up_start = now;
            self.units_completed_at_catch_up_start = self.units_completed;
        }

        let units_since_catch_up_start = self.units_completed - self.units_completed_at_catch_up_start;
        let catch_up_throughput = self.catch_up_rate_multiple * self.throughput_per_nsec;
        let catch_up_target = self.catch_up_start
            + Duration::from_nanos((units_since_catch_up_start as f64 / catch_up_throughput) as u64);

        if catch_up_target > now {
            Some(catch_up_target - now)
        } else {
            None
        }
    }

    /// Wait until the next unit is due, then account for it.
    pub async fn acquire(&mut self) {
        if let Some(delay) = self.delay_until_next_send(Instant::now()) {
            tokio::time::sleep(delay).await;
        }
        self.units_completed += 1;
    }

    pub fn units_completed(&self) -> u64 {
        self.units_completed
    }
}

// ─── Tests ───────────────────────────────────────────────────────
