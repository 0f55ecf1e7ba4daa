//! JSON shapes of the Cloud Monitoring v2beta2 API.

use crate::domain::descriptor::{MetricDescriptor, PointValue, TimeseriesPoint, ValueKind};
use crate::domain::naming::name_in_domain;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Descriptors are always registered as gauges.
pub const GAUGE: &str = "gauge";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WireMetricDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<WireLabelDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_descriptor: Option<WireTypeDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireLabelDescriptor {
    pub key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WireTypeDescriptor {
    pub metric_type: String,
    pub value_type: String,
}

impl From<&MetricDescriptor> for WireMetricDescriptor {
    fn from(desc: &MetricDescriptor) -> Self {
        Self {
            name: desc.name.clone(),
            description: desc.description.clone(),
            labels: desc
                .labels
                .iter()
                .map(|(key, description)| WireLabelDescriptor {
                    key: key.clone(),
                    description: description.clone(),
                })
                .collect(),
            type_descriptor: Some(WireTypeDescriptor {
                metric_type: GAUGE.to_string(),
                value_type: desc.value_kind.as_str().to_string(),
            }),
        }
    }
}

impl WireMetricDescriptor {
    /// Built-in descriptors may use value types this crate never writes
    /// (bool, string, distribution). Those are reported as `Double`.
    pub fn into_domain(self) -> MetricDescriptor {
        let value_kind = self
            .type_descriptor
            .as_ref()
            .and_then(|t| ValueKind::parse(&t.value_type))
            .unwrap_or(ValueKind::Double);

        MetricDescriptor {
            name: self.name,
            description: self.description,
            labels: self
                .labels
                .into_iter()
                .map(|l| (l.key, l.description))
                .collect(),
            value_kind,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListMetricDescriptorsResponse {
    #[serde(default)]
    pub metrics: Vec<WireMetricDescriptor>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WriteTimeseriesRequest {
    pub common_labels: BTreeMap<String, String>,
    pub timeseries: Vec<WireTimeseriesPoint>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WireTimeseriesPoint {
    pub timeseries_desc: WireTimeseriesDescriptor,
    pub point: WirePoint,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WireTimeseriesDescriptor {
    pub metric: String,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WirePoint {
    pub start: String,
    pub end: String,
    /// int64 travels as a decimal string in Google JSON APIs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub int64_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub double_value: Option<f64>,
}

/// RFC3339 at second precision with a `Z` suffix.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl From<&TimeseriesPoint> for WireTimeseriesPoint {
    fn from(point: &TimeseriesPoint) -> Self {
        let now = format_timestamp(&point.timestamp);
        let (int64_value, double_value) = match point.value() {
            Some(PointValue::Int64(v)) => (Some(v.to_string()), None),
            Some(PointValue::Double(v)) => (None, Some(v)),
            None => (None, None),
        };

        Self {
            timeseries_desc: WireTimeseriesDescriptor {
                metric: point.metric_name.clone(),
                labels: point
                    .labels
                    .iter()
                    .map(|(k, v)| (name_in_domain(k), v.clone()))
                    .collect(),
            },
            point: WirePoint {
                start: now.clone(),
                end: now,
                int64_value,
                double_value,
            },
        }
    }
}

impl WriteTimeseriesRequest {
    pub fn from_points(points: &[TimeseriesPoint]) -> Self {
        Self {
            common_labels: BTreeMap::new(),
            timeseries: points.iter().map(WireTimeseriesPoint::from).collect(),
        }
    }
}
