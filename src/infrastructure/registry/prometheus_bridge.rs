//! Publishes Prometheus collectors through the same reporter.
//!
//! Processes that already instrument themselves with the `prometheus` crate
//! register their counters and gauges here. They remain exportable in the
//! Prometheus text format via `render()` and are also visible to the
//! reporter as counter and gauge capabilities.

use crate::domain::metric::{CounterStats, GaugeStats, Metric};
use crate::domain::ports::MetricRegistry;
use prometheus::{Gauge, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

impl CounterStats for IntCounter {
    fn count(&self) -> i64 {
        i64::try_from(self.get()).unwrap_or(i64::MAX)
    }
}

impl Metric for IntCounter {
    fn as_counter(&self) -> Option<&dyn CounterStats> {
        Some(self)
    }
}

impl GaugeStats for Gauge {
    fn value(&self) -> f64 {
        self.get()
    }
}

impl Metric for Gauge {
    fn as_gauge(&self) -> Option<&dyn GaugeStats> {
        Some(self)
    }
}

impl GaugeStats for IntGauge {
    fn value(&self) -> f64 {
        self.get() as f64
    }
}

impl Metric for IntGauge {
    fn as_gauge(&self) -> Option<&dyn GaugeStats> {
        Some(self)
    }
}

/// Prometheus registry whose collectors are also reportable.
#[derive(Clone)]
pub struct PrometheusRegistry {
    registry: Arc<Registry>,
    reportable: Arc<RwLock<BTreeMap<String, Arc<dyn Metric>>>>,
}

impl PrometheusRegistry {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            reportable: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    pub fn inner(&self) -> &Registry {
        &self.registry
    }

    fn track(&self, name: &str, metric: Arc<dyn Metric>) {
        self.reportable
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), metric);
    }

    pub fn int_counter(&self, name: &str, help: &str) -> prometheus::Result<IntCounter> {
        let counter = IntCounter::with_opts(Opts::new(name, help))?;
        self.registry.register(Box::new(counter.clone()))?;
        self.track(name, Arc::new(counter.clone()));
        Ok(counter)
    }

    pub fn gauge(&self, name: &str, help: &str) -> prometheus::Result<Gauge> {
        let gauge = Gauge::with_opts(Opts::new(name, help))?;
        self.registry.register(Box::new(gauge.clone()))?;
        self.track(name, Arc::new(gauge.clone()));
        Ok(gauge)
    }

    pub fn int_gauge(&self, name: &str, help: &str) -> prometheus::Result<IntGauge> {
        let gauge = IntGauge::with_opts(Opts::new(name, help))?;
        self.registry.register(Box::new(gauge.clone()))?;
        self.track(name, Arc::new(gauge.clone()));
        Ok(gauge)
    }

    /// Render all collectors in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }
}

impl Default for PrometheusRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricRegistry for PrometheusRegistry {
    fn snapshot(&self) -> Vec<(String, Arc<dyn Metric>)> {
        self.reportable
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(name, metric)| (name.clone(), metric.clone()))
            .collect()
    }
}
