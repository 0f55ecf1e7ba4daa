//! In-process metric registries consumed by the reporter.

pub mod counter;
pub mod memory;
pub mod meter;
pub mod prometheus_bridge;

pub use counter::Counter;
pub use memory::InMemoryRegistry;
pub use meter::Meter;
pub use prometheus_bridge::PrometheusRegistry;
