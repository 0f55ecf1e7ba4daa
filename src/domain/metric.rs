//! Capability model for in-process metrics.
//!
//! A registry hands out `Arc<dyn Metric>` values. Each metric advertises the
//! statistics it can provide through the `as_*` accessors, and the reporter
//! asks its `SampleExtractor`s to turn whichever capabilities are present
//! into publishable samples. Supporting a new kind of metric means adding a
//! capability and an extractor; the reporting loop stays untouched.

use crate::domain::descriptor::ValueKind;

/// Point-in-time view of a meter.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeterSnapshot {
    pub count: i64,
    /// Events per second, 1-minute EWMA
    pub rate1: f64,
    pub rate5: f64,
    pub rate15: f64,
    /// Events per second since the meter was created
    pub rate_mean: f64,
}

pub trait MeterStats: Send + Sync {
    fn meter_snapshot(&self) -> MeterSnapshot;
}

pub trait CounterStats: Send + Sync {
    fn count(&self) -> i64;
}

pub trait GaugeStats: Send + Sync {
    fn value(&self) -> f64;
}

/// A metric object as stored in a registry.
pub trait Metric: Send + Sync {
    fn as_meter(&self) -> Option<&dyn MeterStats> {
        None
    }

    fn as_counter(&self) -> Option<&dyn CounterStats> {
        None
    }

    fn as_gauge(&self) -> Option<&dyn GaugeStats> {
        None
    }
}

/// Which meter sub-metrics get published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishPolicy {
    /// `<name>.count` only
    CountOnly,
    /// `<name>.count` plus the one/five/fifteen-minute and mean rates
    #[default]
    FullBreakdown,
}

impl std::str::FromStr for PublishPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "count" | "count-only" => Ok(PublishPolicy::CountOnly),
            "full" | "full-breakdown" => Ok(PublishPolicy::FullBreakdown),
            _ => anyhow::bail!("Invalid publish policy: {}. Must be 'full' or 'count'", s),
        }
    }
}

/// One value derived from a registry entry, still using its local name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleValue {
    Int64(i64),
    Double(f64),
}

impl SampleValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            SampleValue::Int64(_) => ValueKind::Int64,
            SampleValue::Double(_) => ValueKind::Double,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Local (un-namespaced) name, e.g. `requests.one-minute`
    pub name: String,
    pub value: SampleValue,
}

impl Sample {
    pub fn int64(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value: SampleValue::Int64(value),
        }
    }

    pub fn double(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value: SampleValue::Double(value),
        }
    }
}

/// Turns one capability of a metric into samples.
pub trait SampleExtractor: Send + Sync {
    /// Empty when the metric lacks the capability this extractor handles.
    fn extract(&self, name: &str, metric: &dyn Metric, policy: PublishPolicy) -> Vec<Sample>;
}

pub struct MeterExtractor;

impl SampleExtractor for MeterExtractor {
    fn extract(&self, name: &str, metric: &dyn Metric, policy: PublishPolicy) -> Vec<Sample> {
        let Some(meter) = metric.as_meter() else {
            return Vec::new();
        };
        let snap = meter.meter_snapshot();

        let mut samples = vec![Sample::int64(format!("{}.count", name), snap.count)];
        if policy == PublishPolicy::FullBreakdown {
            samples.push(Sample::double(format!("{}.one-minute", name), snap.rate1));
            samples.push(Sample::double(format!("{}.five-minute", name), snap.rate5));
            samples.push(Sample::double(
                format!("{}.fifteen-minute", name),
                snap.rate15,
            ));
            samples.push(Sample::double(format!("{}.mean", name), snap.rate_mean));
        }
        samples
    }
}

pub struct CounterExtractor;

impl SampleExtractor for CounterExtractor {
    fn extract(&self, name: &str, metric: &dyn Metric, _policy: PublishPolicy) -> Vec<Sample> {
        match metric.as_counter() {
            Some(counter) => vec![Sample::int64(format!("{}.count", name), counter.count())],
            None => Vec::new(),
        }
    }
}

pub struct GaugeExtractor;

impl SampleExtractor for GaugeExtractor {
    fn extract(&self, name: &str, metric: &dyn Metric, _policy: PublishPolicy) -> Vec<Sample> {
        match metric.as_gauge() {
            Some(gauge) => vec![Sample::double(format!("{}.value", name), gauge.value())],
            None => Vec::new(),
        }
    }
}

/// Extractors for every built-in capability.
pub fn default_extractors() -> Vec<Box<dyn SampleExtractor>> {
    vec![
        Box::new(MeterExtractor),
        Box::new(CounterExtractor),
        Box::new(GaugeExtractor),
    ]
}
