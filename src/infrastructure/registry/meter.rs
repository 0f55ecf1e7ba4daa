use crate::domain::metric::{MeterSnapshot, MeterStats, Metric};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// EWMA tick period. Rates are folded in every 5 seconds.
pub const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Exponentially weighted moving average of a per-second rate.
#[derive(Debug, Clone)]
struct Ewma {
    alpha: f64,
    rate: f64,
    uncounted: i64,
    initialized: bool,
}

impl Ewma {
    fn for_minutes(minutes: f64) -> Self {
        let alpha = 1.0 - (-TICK_INTERVAL.as_secs_f64() / 60.0 / minutes).exp();
        Self {
            alpha,
            rate: 0.0,
            uncounted: 0,
            initialized: false,
        }
    }

    fn update(&mut self, n: i64) {
        self.uncounted += n;
    }

    fn tick(&mut self) {
        let instant_rate = self.uncounted as f64 / TICK_INTERVAL.as_secs_f64();
        self.uncounted = 0;
        if self.initialized {
            self.rate += self.alpha * (instant_rate - self.rate);
        } else {
            self.rate = instant_rate;
            self.initialized = true;
        }
    }
}

#[derive(Debug)]
struct MeterState {
    count: i64,
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
    start: Instant,
    last_tick: Instant,
}

impl MeterState {
    fn tick_if_necessary(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_tick);
        let ticks = elapsed.as_nanos() / TICK_INTERVAL.as_nanos();
        for _ in 0..ticks {
            self.m1.tick();
            self.m5.tick();
            self.m15.tick();
        }
        self.last_tick += TICK_INTERVAL * ticks as u32;
    }
}

/// Counts events and tracks their 1, 5 and 15-minute moving rates.
///
/// Ticking is lazy: pending 5-second ticks are applied whenever the meter is
/// marked or read, so no background task is needed.
#[derive(Debug)]
pub struct Meter {
    state: Mutex<MeterState>,
}

impl Meter {
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    fn started_at(start: Instant) -> Self {
        Self {
            state: Mutex::new(MeterState {
                count: 0,
                m1: Ewma::for_minutes(1.0),
                m5: Ewma::for_minutes(5.0),
                m15: Ewma::for_minutes(15.0),
                start,
                last_tick: start,
            }),
        }
    }

    /// Record `n` events.
    pub fn mark(&self, n: i64) {
        self.mark_at(n, Instant::now());
    }

    fn mark_at(&self, n: i64, now: Instant) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.tick_if_necessary(now);
        state.count += n;
        state.m1.update(n);
        state.m5.update(n);
        state.m15.update(n);
    }

    pub fn count(&self) -> i64 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).count
    }

    fn snapshot_at(&self, now: Instant) -> MeterSnapshot {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.tick_if_necessary(now);

        let elapsed = now.saturating_duration_since(state.start).as_secs_f64();
        let rate_mean = if elapsed > 0.0 {
            state.count as f64 / elapsed
        } else {
            0.0
        };

        MeterSnapshot {
            count: state.count,
            rate1: state.m1.rate,
            rate5: state.m5.rate,
            rate15: state.m15.rate,
            rate_mean,
        }
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}

impl MeterStats for Meter {
    fn meter_snapshot(&self) -> MeterSnapshot {
        self.snapshot_at(Instant::now())
    }
}

impl Metric for Meter {
    fn as_meter(&self) -> Option<&dyn MeterStats> {
        Some(self)
    }
}
