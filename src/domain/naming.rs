//! Reverse-domain naming for custom metrics and labels.
//!
//! Custom metric descriptors (and their label keys) live under a fixed
//! namespace so the monitoring backend can tell them apart from the metrics
//! it produces itself.

use crate::domain::descriptor::MetricDescriptor;

/// Namespace prefix for every self-registered metric and label key.
pub const METRIC_DOMAIN: &str = "custom.cloudmonitoring.googleapis.com/";

/// Prefix `name` with the custom metric domain.
///
/// Names are normally hierarchical, separated with `/`. Not idempotent:
/// applying it to an already qualified name prefixes it a second time.
pub fn name_in_domain(name: &str) -> String {
    format!("{}{}", METRIC_DOMAIN, name)
}

/// True when the descriptor was registered under the custom domain.
pub fn is_custom(descriptor: &MetricDescriptor) -> bool {
    descriptor.name.starts_with(&name_in_domain(""))
}
