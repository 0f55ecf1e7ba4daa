//! Maintenance operations on remote descriptors.

use crate::domain::descriptor::MetricDescriptor;
use crate::domain::errors::MonitoringResult;
use crate::domain::naming::is_custom;
use crate::domain::ports::MonitoringService;
use tracing::{info, warn};

/// Descriptors registered under the custom metric domain.
pub async fn list_custom_descriptors(
    service: &dyn MonitoringService,
) -> MonitoringResult<Vec<MetricDescriptor>> {
    let descriptors = service.list_descriptors().await?;
    Ok(descriptors.into_iter().filter(is_custom).collect())
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PurgeReport {
    pub deleted: Vec<String>,
    /// (descriptor name, error)
    pub failed: Vec<(String, String)>,
}

/// Delete every custom descriptor. Built-in descriptors are never touched.
///
/// Only the listing can fail the whole operation; individual deletions are
/// attempted independently and collected in the report.
pub async fn delete_custom_descriptors(
    service: &dyn MonitoringService,
) -> MonitoringResult<PurgeReport> {
    let mut report = PurgeReport::default();

    for descriptor in list_custom_descriptors(service).await? {
        match service.delete_descriptor(&descriptor.name).await {
            Ok(()) => {
                info!("Admin: Deleted {}", descriptor.name);
                report.deleted.push(descriptor.name);
            }
            Err(e) => {
                warn!("Admin: Failed to delete {}: {}", descriptor.name, e);
                report.failed.push((descriptor.name, e.to_string()));
            }
        }
    }

    Ok(report)
}
