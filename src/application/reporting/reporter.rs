//! Periodic publisher of in-process metrics to the monitoring backend.
//!
//! Each tick walks the registry snapshot, derives samples through the
//! configured extractors, lazily registers a descriptor for every sample
//! name the first time it is seen, and writes one labelled point per
//! sample. Failures are logged and recorded in the `TickReport`; they never
//! stop the loop or the remaining metrics of the same tick.

use super::tracked_metrics::TrackedMetrics;
use crate::domain::descriptor::{MetricDescriptor, TimeseriesPoint};
use crate::domain::metric::{PublishPolicy, Sample, SampleExtractor, SampleValue, default_extractors};
use crate::domain::naming::name_in_domain;
use crate::domain::ports::{HostIdentity, MetricRegistry, MonitoringService};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Label attached to every point.
pub const HOSTNAME_LABEL: &str = "hostname";

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStage {
    Hostname,
    Register,
    Write,
}

impl fmt::Display for PublishStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PublishStage::Hostname => "hostname",
            PublishStage::Register => "register",
            PublishStage::Write => "write",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishFailure {
    /// Local metric or sample name
    pub metric: String,
    pub stage: PublishStage,
    pub error: String,
}

/// Outcome of one pass over the registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub metrics_seen: usize,
    pub registrations_attempted: usize,
    pub points_written: usize,
    pub failures: Vec<PublishFailure>,
}

impl TickReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, metric: &str, stage: PublishStage, error: impl fmt::Display) {
        self.failures.push(PublishFailure {
            metric: metric.to_string(),
            stage,
            error: error.to_string(),
        });
    }
}

pub struct MetricsReporter {
    service: Arc<dyn MonitoringService>,
    registry: Arc<dyn MetricRegistry>,
    host: Arc<dyn HostIdentity>,
    tracked: TrackedMetrics,
    policy: PublishPolicy,
    interval: Duration,
    extractors: Vec<Box<dyn SampleExtractor>>,
}

impl MetricsReporter {
    /// Create a reporter publishing the full meter breakdown with the
    /// built-in extractors.
    ///
    /// # Arguments
    /// * `service` - Remote monitoring backend
    /// * `registry` - In-process metrics to publish
    /// * `host` - Source of the `hostname` label
    /// * `interval` - Time between ticks; zero falls back to 60s
    pub fn new(
        service: Arc<dyn MonitoringService>,
        registry: Arc<dyn MetricRegistry>,
        host: Arc<dyn HostIdentity>,
        interval: Duration,
    ) -> Self {
        let interval = if interval.is_zero() {
            warn!(
                "MetricsReporter: Zero interval requested, using {:?}",
                DEFAULT_INTERVAL
            );
            DEFAULT_INTERVAL
        } else {
            interval
        };

        Self {
            service,
            registry,
            host,
            tracked: TrackedMetrics::new(),
            policy: PublishPolicy::default(),
            interval,
            extractors: default_extractors(),
        }
    }

    pub fn with_policy(mut self, policy: PublishPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Add support for another metric capability.
    pub fn with_extractor(mut self, extractor: Box<dyn SampleExtractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    pub fn policy(&self) -> PublishPolicy {
        self.policy
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn tracked(&self) -> &TrackedMetrics {
        &self.tracked
    }

    /// Publish every metric of the registry once.
    pub async fn report_once(&mut self) -> TickReport {
        let mut report = TickReport::default();

        for (name, metric) in self.registry.snapshot() {
            report.metrics_seen += 1;

            // A metric with several capabilities may yield the same sample
            // name twice; the first extractor wins.
            let mut sample_names = HashSet::new();
            let samples: Vec<Sample> = self
                .extractors
                .iter()
                .flat_map(|e| e.extract(&name, metric.as_ref(), self.policy))
                .filter(|s| sample_names.insert(s.name.clone()))
                .collect();
            if samples.is_empty() {
                debug!("MetricsReporter: {} has no publishable capability", name);
                continue;
            }

            let hostname = match self.host.hostname() {
                Ok(h) => h,
                Err(e) => {
                    warn!("MetricsReporter: Skipping {}: {}", name, e);
                    report.fail(&name, PublishStage::Hostname, e);
                    continue;
                }
            };

            let now = Utc::now();
            for sample in samples {
                self.publish_sample(&sample, &hostname, now, &mut report)
                    .await;
            }
        }

        report
    }

    async fn publish_sample(
        &mut self,
        sample: &Sample,
        hostname: &str,
        now: DateTime<Utc>,
        report: &mut TickReport,
    ) {
        let qualified = name_in_domain(&sample.name);
        self.ensure_registered(&qualified, sample, report).await;

        let point = match sample.value {
            SampleValue::Int64(v) => TimeseriesPoint::int64(&qualified, now, v),
            SampleValue::Double(v) => TimeseriesPoint::double(&qualified, now, v),
        }
        .with_label(HOSTNAME_LABEL, hostname);

        match self.service.write_timeseries(&[point]).await {
            Ok(()) => report.points_written += 1,
            Err(e) => {
                warn!("MetricsReporter: Failed to write {}: {}", sample.name, e);
                report.fail(&sample.name, PublishStage::Write, e);
            }
        }
    }

    /// Create the descriptor on first sight of `qualified`.
    ///
    /// The name is tracked before the call, so a failed creation is not
    /// retried during this process. Writing proceeds either way.
    async fn ensure_registered(
        &mut self,
        qualified: &str,
        sample: &Sample,
        report: &mut TickReport,
    ) {
        if !self.tracked.mark(qualified) {
            return;
        }
        report.registrations_attempted += 1;

        let descriptor = MetricDescriptor::new(qualified, sample.value.kind())
            .with_description(format!("In-process metric {}", sample.name))
            .with_label(
                name_in_domain(HOSTNAME_LABEL),
                "Host the sample was taken on",
            );

        match self.service.create_descriptor(&descriptor).await {
            Ok(()) => info!("MetricsReporter: Registered {}", qualified),
            Err(e) if e.is_already_exists() => {
                debug!("MetricsReporter: {} already registered", qualified)
            }
            Err(e) => {
                warn!("MetricsReporter: Failed to register {}: {}", qualified, e);
                report.fail(&sample.name, PublishStage::Register, e);
            }
        }
    }

    /// Report every `interval` until the process exits.
    pub async fn run(self) {
        self.run_until(std::future::pending()).await;
    }

    /// Report every `interval` until `shutdown` resolves.
    ///
    /// Ticks never overlap: a slow pass delays the next tick instead of
    /// bursting to catch up. A tick in progress is finished before
    /// shutdown is honoured.
    pub async fn run_until<F>(mut self, shutdown: F) -> Self
    where
        F: Future<Output = ()>,
    {
        info!(
            "MetricsReporter: Starting (interval: {:?}, policy: {:?})",
            self.interval, self.policy
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; publish one interval after start.
        ticker.tick().await;

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("MetricsReporter: Shutdown requested, stopping");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let report = self.report_once().await;
            if report.is_clean() {
                info!(
                    "MetricsReporter: Published {} points from {} metrics",
                    report.points_written, report.metrics_seen
                );
            } else {
                warn!(
                    "MetricsReporter: Published {} points from {} metrics, {} failures",
                    report.points_written,
                    report.metrics_seen,
                    report.failures.len()
                );
            }
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{MonitoringError, MonitoringResult};
    use crate::domain::metric::{MeterSnapshot, MeterStats, Metric};
    use crate::infrastructure::mock::MockMonitoringService;
    use crate::infrastructure::host::StaticHostIdentity;
    use crate::infrastructure::registry::{Counter, InMemoryRegistry};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedMeter(MeterSnapshot);

    impl MeterStats for FixedMeter {
        fn meter_snapshot(&self) -> MeterSnapshot {
            self.0
        }
    }

    impl Metric for FixedMeter {
        fn as_meter(&self) -> Option<&dyn MeterStats> {
            Some(self)
        }
    }

    fn requests_meter() -> Arc<FixedMeter> {
        Arc::new(FixedMeter(MeterSnapshot {
            count: 42,
            rate1: 1.5,
            rate5: 0.9,
            rate15: 0.3,
            rate_mean: 1.1,
        }))
    }

    fn reporter(
        mock: &MockMonitoringService,
        registry: &InMemoryRegistry,
    ) -> MetricsReporter {
        MetricsReporter::new(
            Arc::new(mock.clone()),
            Arc::new(registry.clone()),
            Arc::new(StaticHostIdentity("web-1".to_string())),
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn test_full_breakdown_publishes_five_points() {
        let mock = MockMonitoringService::new();
        let registry = InMemoryRegistry::new();
        registry.register("requests", requests_meter());

        let mut reporter = reporter(&mock, &registry);
        let report = reporter.report_once().await;

        assert!(report.is_clean());
        assert_eq!(report.points_written, 5);
        let batches = mock.write_batches().await;
        assert_eq!(batches.len(), 5);
        assert!(batches.iter().all(|b| b.len() == 1));

        let points = mock.written_points().await;
        let got: Vec<(String, i64, f64)> = points
            .iter()
            .map(|p| (p.metric_name.clone(), p.int64_value, p.double_value))
            .collect();
        assert_eq!(
            got,
            vec![
                (name_in_domain("requests.count"), 42, 0.0),
                (name_in_domain("requests.one-minute"), 0, 1.5),
                (name_in_domain("requests.five-minute"), 0, 0.9),
                (name_in_domain("requests.fifteen-minute"), 0, 0.3),
                (name_in_domain("requests.mean"), 0, 1.1),
            ]
        );
        for p in &points {
            assert_eq!(p.labels.get(HOSTNAME_LABEL).map(String::as_str), Some("web-1"));
        }

        let count_desc = mock
            .descriptor(&name_in_domain("requests.count"))
            .await
            .expect("count descriptor");
        assert_eq!(count_desc.value_kind, crate::domain::ValueKind::Int64);
        assert!(count_desc.labels.contains_key(&name_in_domain("hostname")));
        let mean_desc = mock
            .descriptor(&name_in_domain("requests.mean"))
            .await
            .expect("mean descriptor");
        assert_eq!(mean_desc.value_kind, crate::domain::ValueKind::Double);
    }

    #[tokio::test]
    async fn test_count_only_policy() {
        let mock = MockMonitoringService::new();
        let registry = InMemoryRegistry::new();
        registry.register("requests", requests_meter());

        let mut reporter = reporter(&mock, &registry).with_policy(PublishPolicy::CountOnly);
        let report = reporter.report_once().await;

        assert_eq!(report.points_written, 1);
        assert_eq!(mock.create_calls().await, vec![name_in_domain("requests.count")]);
    }

    #[tokio::test]
    async fn test_registration_attempted_once_across_ticks() {
        let mock = MockMonitoringService::new();
        let registry = InMemoryRegistry::new();
        registry.register("requests", requests_meter());

        let mut reporter = reporter(&mock, &registry);
        for _ in 0..3 {
            reporter.report_once().await;
        }

        let creates = mock.create_calls().await;
        assert_eq!(creates.len(), 5);
        let count_creates = creates
            .iter()
            .filter(|n| *n == &name_in_domain("requests.count"))
            .count();
        assert_eq!(count_creates, 1);
        assert_eq!(mock.written_points().await.len(), 15);
        assert_eq!(reporter.tracked().len(), 5);
    }

    #[tokio::test]
    async fn test_registration_failure_does_not_block_writes() {
        let mock = MockMonitoringService::new();
        mock.fail_create_for(name_in_domain("jobs.count")).await;
        let registry = InMemoryRegistry::new();
        registry.get_or_register_counter("jobs").unwrap().inc(3);

        let mut reporter = reporter(&mock, &registry);
        let first = reporter.report_once().await;
        assert_eq!(first.points_written, 1);
        assert_eq!(first.failures.len(), 1);
        assert_eq!(first.failures[0].stage, PublishStage::Register);

        // Not retried on the next tick, but still written.
        let second = reporter.report_once().await;
        assert!(second.is_clean());
        assert_eq!(second.registrations_attempted, 0);
        assert_eq!(mock.create_calls().await.len(), 1);
        assert_eq!(mock.written_points().await.len(), 2);
    }

    #[tokio::test]
    async fn test_already_exists_is_not_a_failure() {
        let mock = MockMonitoringService::new();
        mock.insert_descriptor(crate::domain::MetricDescriptor::new(
            name_in_domain("jobs.count"),
            crate::domain::ValueKind::Int64,
        ))
        .await;
        let registry = InMemoryRegistry::new();
        registry.get_or_register_counter("jobs").unwrap().inc(1);

        let report = reporter(&mock, &registry).report_once().await;
        assert!(report.is_clean());
        assert_eq!(report.registrations_attempted, 1);
    }

    #[tokio::test]
    async fn test_write_failure_isolated_per_metric() {
        let mock = MockMonitoringService::new();
        mock.fail_write_for(name_in_domain("a.count")).await;
        let registry = InMemoryRegistry::new();
        registry.get_or_register_counter("a").unwrap().inc(1);
        registry.get_or_register_counter("b").unwrap().inc(2);

        let report = reporter(&mock, &registry).report_once().await;

        assert_eq!(report.points_written, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].metric, "a.count");
        assert_eq!(report.failures[0].stage, PublishStage::Write);
        assert!(report.failures[0].error.contains("injected failure"));
        let written = mock.written_points().await;
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].metric_name, name_in_domain("b.count"));
        assert_eq!(written[0].int64_value, 2);
    }

    /// Fails on the first lookup only.
    struct FlakyHost {
        calls: AtomicUsize,
    }

    impl HostIdentity for FlakyHost {
        fn hostname(&self) -> MonitoringResult<String> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(MonitoringError::LocalEnvironment {
                    reason: "no hostname".to_string(),
                })
            } else {
                Ok("web-2".to_string())
            }
        }
    }

    #[tokio::test]
    async fn test_hostname_failure_skips_only_current_metric() {
        let mock = MockMonitoringService::new();
        let registry = InMemoryRegistry::new();
        registry.get_or_register_counter("a").unwrap().inc(1);
        registry.get_or_register_counter("b").unwrap().inc(2);

        let mut reporter = MetricsReporter::new(
            Arc::new(mock.clone()),
            Arc::new(registry.clone()),
            Arc::new(FlakyHost {
                calls: AtomicUsize::new(0),
            }),
            Duration::from_secs(60),
        );
        let report = reporter.report_once().await;

        assert_eq!(report.metrics_seen, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].metric, "a");
        assert_eq!(report.failures[0].stage, PublishStage::Hostname);
        let written = mock.written_points().await;
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].metric_name, name_in_domain("b.count"));
        // "a" was never seen by the registration path.
        assert!(!reporter.tracked().contains(&name_in_domain("a.count")));

        let next = reporter.report_once().await;
        assert!(next.is_clean());
        assert_eq!(next.points_written, 2);
    }

    // Regression: zero-valued samples are still written, without a value.
    #[tokio::test]
    async fn test_zero_counter_written_without_value() {
        let mock = MockMonitoringService::new();
        let registry = InMemoryRegistry::new();
        registry.register("idle", Arc::new(Counter::new()));

        let report = reporter(&mock, &registry).report_once().await;
        assert_eq!(report.points_written, 1);
        let written = mock.written_points().await;
        assert_eq!(written[0].value(), None);
    }

    struct Opaque;
    impl Metric for Opaque {}

    /// Exposes both meter and counter capabilities.
    struct MeterAndCounter(MeterSnapshot);

    impl MeterStats for MeterAndCounter {
        fn meter_snapshot(&self) -> MeterSnapshot {
            self.0
        }
    }

    impl crate::domain::metric::CounterStats for MeterAndCounter {
        fn count(&self) -> i64 {
            -1
        }
    }

    impl Metric for MeterAndCounter {
        fn as_meter(&self) -> Option<&dyn MeterStats> {
            Some(self)
        }

        fn as_counter(&self) -> Option<&dyn crate::domain::metric::CounterStats> {
            Some(self)
        }
    }

    #[tokio::test]
    async fn test_overlapping_capabilities_publish_each_name_once() {
        let mock = MockMonitoringService::new();
        let registry = InMemoryRegistry::new();
        registry.register(
            "requests",
            Arc::new(MeterAndCounter(MeterSnapshot {
                count: 7,
                ..Default::default()
            })),
        );

        let mut reporter = reporter(&mock, &registry).with_policy(PublishPolicy::CountOnly);
        let report = reporter.report_once().await;

        assert_eq!(report.points_written, 1);
        let written = mock.written_points().await;
        assert_eq!(written.len(), 1);
        // The meter extractor runs first, so its count is the one kept.
        assert_eq!(written[0].int64_value, 7);
        assert_eq!(mock.create_calls().await, vec![name_in_domain("requests.count")]);
    }

    #[tokio::test]
    async fn test_metric_without_capability_is_skipped() {
        let mock = MockMonitoringService::new();
        let registry = InMemoryRegistry::new();
        registry.register("opaque", Arc::new(Opaque));

        let report = reporter(&mock, &registry).report_once().await;
        assert_eq!(report.metrics_seen, 1);
        assert_eq!(report.points_written, 0);
        assert!(mock.create_calls().await.is_empty());
    }

    struct OpaqueExtractor;

    impl SampleExtractor for OpaqueExtractor {
        fn extract(&self, name: &str, _metric: &dyn Metric, _policy: PublishPolicy) -> Vec<Sample> {
            vec![Sample::int64(format!("{}.present", name), 1)]
        }
    }

    #[tokio::test]
    async fn test_custom_extractor_plugs_in() {
        let mock = MockMonitoringService::new();
        let registry = InMemoryRegistry::new();
        registry.register("opaque", Arc::new(Opaque));

        let mut reporter =
            reporter(&mock, &registry).with_extractor(Box::new(OpaqueExtractor));
        let report = reporter.report_once().await;
        assert_eq!(report.points_written, 1);
        assert_eq!(
            mock.written_points().await[0].metric_name,
            name_in_domain("opaque.present")
        );
    }

    #[tokio::test]
    async fn test_zero_interval_falls_back_to_default() {
        let mock = MockMonitoringService::new();
        let registry = InMemoryRegistry::new();
        let reporter = MetricsReporter::new(
            Arc::new(mock),
            Arc::new(registry),
            Arc::new(StaticHostIdentity("h".to_string())),
            Duration::ZERO,
        );
        assert_eq!(reporter.interval(), DEFAULT_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_ticks_and_stops() {
        let mock = MockMonitoringService::new();
        let registry = InMemoryRegistry::new();
        registry.get_or_register_counter("jobs").unwrap().inc(1);

        let reporter = MetricsReporter::new(
            Arc::new(mock.clone()),
            Arc::new(registry),
            Arc::new(StaticHostIdentity("h".to_string())),
            Duration::from_secs(10),
        );

        let reporter = reporter
            .run_until(tokio::time::sleep(Duration::from_secs(35)))
            .await;

        // Ticks at 10s, 20s and 30s.
        assert_eq!(mock.written_points().await.len(), 3);
        assert_eq!(reporter.tracked().len(), 1);
    }
}
