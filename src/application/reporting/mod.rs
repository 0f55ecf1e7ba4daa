pub mod reporter;
pub mod tracked_metrics;

pub use reporter::{
    HOSTNAME_LABEL, MetricsReporter, PublishFailure, PublishStage, TickReport,
};
pub use tracked_metrics::TrackedMetrics;
