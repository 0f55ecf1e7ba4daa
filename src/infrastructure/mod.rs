pub mod cloud_monitoring;
pub mod core;
pub mod host;
pub mod mock;
pub mod registry;

pub use cloud_monitoring::CloudMonitoringClient;
pub use host::{StaticHostIdentity, SystemHostIdentity};
pub use mock::MockMonitoringService;
pub use registry::{Counter, InMemoryRegistry, Meter, PrometheusRegistry};
