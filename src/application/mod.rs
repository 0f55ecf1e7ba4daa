pub mod admin;
pub mod reporting;

pub use reporting::MetricsReporter;
