//! In-memory `MonitoringService` that records every call.

use crate::domain::descriptor::{MetricDescriptor, TimeseriesPoint};
use crate::domain::errors::{MonitoringError, MonitoringResult};
use crate::domain::ports::MonitoringService;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct MockState {
    descriptors: BTreeMap<String, MetricDescriptor>,
    create_calls: Vec<String>,
    delete_calls: Vec<String>,
    write_batches: Vec<Vec<TimeseriesPoint>>,
    failing_creates: HashSet<String>,
    failing_writes: HashSet<String>,
}

#[derive(Clone, Default)]
pub struct MockMonitoringService {
    state: Arc<RwLock<MockState>>,
}

impl MockMonitoringService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `create_descriptor` fail for the fully qualified `name`.
    pub async fn fail_create_for(&self, name: impl Into<String>) {
        self.state.write().await.failing_creates.insert(name.into());
    }

    /// Make `write_timeseries` fail for any batch containing `metric_name`.
    pub async fn fail_write_for(&self, metric_name: impl Into<String>) {
        self.state
            .write()
            .await
            .failing_writes
            .insert(metric_name.into());
    }

    pub async fn clear_failures(&self) {
        let mut state = self.state.write().await;
        state.failing_creates.clear();
        state.failing_writes.clear();
    }

    /// Seed a descriptor as if it had been created earlier.
    pub async fn insert_descriptor(&self, descriptor: MetricDescriptor) {
        self.state
            .write()
            .await
            .descriptors
            .insert(descriptor.name.clone(), descriptor);
    }

    pub async fn create_calls(&self) -> Vec<String> {
        self.state.read().await.create_calls.clone()
    }

    pub async fn delete_calls(&self) -> Vec<String> {
        self.state.read().await.delete_calls.clone()
    }

    pub async fn write_batches(&self) -> Vec<Vec<TimeseriesPoint>> {
        self.state.read().await.write_batches.clone()
    }

    /// Every point of every accepted batch, in submission order.
    pub async fn written_points(&self) -> Vec<TimeseriesPoint> {
        self.state
            .read()
            .await
            .write_batches
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    pub async fn descriptor(&self, name: &str) -> Option<MetricDescriptor> {
        self.state.read().await.descriptors.get(name).cloned()
    }
}

#[async_trait]
impl MonitoringService for MockMonitoringService {
    async fn create_descriptor(&self, descriptor: &MetricDescriptor) -> MonitoringResult<()> {
        let mut state = self.state.write().await;
        state.create_calls.push(descriptor.name.clone());

        if state.failing_creates.contains(&descriptor.name) {
            return Err(MonitoringError::RemoteService {
                operation: "create_descriptor",
                status: 500,
                body: "injected failure".to_string(),
            });
        }
        if state.descriptors.contains_key(&descriptor.name) {
            return Err(MonitoringError::RemoteService {
                operation: "create_descriptor",
                status: 409,
                body: format!("{} already exists", descriptor.name),
            });
        }

        debug!("MockMonitoringService: created {}", descriptor.name);
        state
            .descriptors
            .insert(descriptor.name.clone(), descriptor.clone());
        Ok(())
    }

    async fn delete_descriptor(&self, name: &str) -> MonitoringResult<()> {
        let mut state = self.state.write().await;
        state.delete_calls.push(name.to_string());
        match state.descriptors.remove(name) {
            Some(_) => Ok(()),
            None => Err(MonitoringError::RemoteService {
                operation: "delete_descriptor",
                status: 404,
                body: format!("{} not found", name),
            }),
        }
    }

    async fn list_descriptors(&self) -> MonitoringResult<Vec<MetricDescriptor>> {
        Ok(self.state.read().await.descriptors.values().cloned().collect())
    }

    async fn write_timeseries(&self, points: &[TimeseriesPoint]) -> MonitoringResult<()> {
        let mut state = self.state.write().await;
        if let Some(bad) = points
            .iter()
            .find(|p| state.failing_writes.contains(&p.metric_name))
        {
            return Err(MonitoringError::Transport {
                operation: "write_timeseries",
                source: format!("injected failure for {}", bad.metric_name).into(),
            });
        }
        state.write_batches.push(points.to_vec());
        Ok(())
    }
}
