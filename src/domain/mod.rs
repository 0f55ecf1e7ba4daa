pub mod descriptor;
pub mod errors;
pub mod metric;
pub mod naming;
pub mod ports;

pub use descriptor::{MetricDescriptor, PointValue, TimeseriesPoint, ValueKind};
pub use errors::{MonitoringError, MonitoringResult};
pub use metric::{Metric, MeterSnapshot, PublishPolicy, Sample, SampleExtractor};
pub use naming::{METRIC_DOMAIN, is_custom, name_in_domain};
pub use ports::{HostIdentity, MetricRegistry, MonitoringService};
