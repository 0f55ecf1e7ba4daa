use crate::domain::descriptor::{MetricDescriptor, TimeseriesPoint};
use crate::domain::errors::MonitoringResult;
use crate::domain::metric::Metric;
use async_trait::async_trait;
use std::sync::Arc;

/// Remote monitoring backend, scoped to one project.
#[async_trait]
pub trait MonitoringService: Send + Sync {
    async fn create_descriptor(&self, descriptor: &MetricDescriptor) -> MonitoringResult<()>;
    async fn delete_descriptor(&self, name: &str) -> MonitoringResult<()>;
    /// All descriptors visible in the project, custom and built-in.
    async fn list_descriptors(&self) -> MonitoringResult<Vec<MetricDescriptor>>;
    /// Submit the whole batch in one call. All or nothing.
    async fn write_timeseries(&self, points: &[TimeseriesPoint]) -> MonitoringResult<()>;
}

/// Identity of the machine the samples are taken on.
pub trait HostIdentity: Send + Sync {
    fn hostname(&self) -> MonitoringResult<String>;
}

/// Source of in-process metrics, read once per reporting tick.
pub trait MetricRegistry: Send + Sync {
    fn snapshot(&self) -> Vec<(String, Arc<dyn Metric>)>;
}
