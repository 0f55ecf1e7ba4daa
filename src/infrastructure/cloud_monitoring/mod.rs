//! Cloud Monitoring (v2beta2) adapter for the `MonitoringService` port.

pub mod client;
pub mod wire;

pub use client::{CloudMonitoringClient, DEFAULT_BASE_URL};
