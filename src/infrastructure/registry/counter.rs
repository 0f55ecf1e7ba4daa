use crate::domain::metric::{CounterStats, Metric};
use std::sync::atomic::{AtomicI64, Ordering};

/// Thread-safe event counter.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicI64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self, n: i64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn dec(&self, n: i64) {
        self.value.fetch_sub(n, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

impl CounterStats for Counter {
    fn count(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Metric for Counter {
    fn as_counter(&self) -> Option<&dyn CounterStats> {
        Some(self)
    }
}
