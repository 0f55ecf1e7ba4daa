use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Value type of a metric descriptor. Every descriptor is a gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int64,
    Double,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Int64 => "int64",
            ValueKind::Double => "double",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "int64" => Some(ValueKind::Int64),
            "double" => Some(ValueKind::Double),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote registration of a metric: its name, label schema and value kind.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDescriptor {
    /// Fully qualified name (see `naming::name_in_domain`)
    pub name: String,
    pub description: String,
    /// Label key -> human readable description
    pub labels: BTreeMap<String, String>,
    pub value_kind: ValueKind,
}

impl MetricDescriptor {
    pub fn new(name: impl Into<String>, value_kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            labels: BTreeMap::new(),
            value_kind,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, description: impl Into<String>) -> Self {
        self.labels.insert(key.into(), description.into());
        self
    }
}

/// Value carried by a single data point on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointValue {
    Int64(i64),
    Double(f64),
}

impl PointValue {
    /// Pick the value to emit for a point.
    ///
    /// A strictly positive integer wins, otherwise a strictly positive
    /// double, otherwise nothing. Zero and negative values are therefore
    /// dropped; downstream dashboards have always seen that behaviour.
    pub fn select(int64_value: i64, double_value: f64) -> Option<Self> {
        if int64_value > 0 {
            Some(PointValue::Int64(int64_value))
        } else if double_value > 0.0 {
            Some(PointValue::Double(double_value))
        } else {
            None
        }
    }
}

/// One timestamped, labelled sample of a metric, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeseriesPoint {
    /// Fully qualified metric name
    pub metric_name: String,
    pub timestamp: DateTime<Utc>,
    pub int64_value: i64,
    pub double_value: f64,
    /// Raw (un-namespaced) label key -> value
    pub labels: BTreeMap<String, String>,
}

impl TimeseriesPoint {
    pub fn int64(metric_name: impl Into<String>, timestamp: DateTime<Utc>, value: i64) -> Self {
        Self {
            metric_name: metric_name.into(),
            timestamp,
            int64_value: value,
            double_value: 0.0,
            labels: BTreeMap::new(),
        }
    }

    pub fn double(metric_name: impl Into<String>, timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            metric_name: metric_name.into(),
            timestamp,
            int64_value: 0,
            double_value: value,
            labels: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn value(&self) -> Option<PointValue> {
        PointValue::select(self.int64_value, self.double_value)
    }
}
