//! Configuration module for cloudmon.
//!
//! Settings are loaded from environment variables (optionally seeded from a
//! `.env` file by the binary).

mod reporter_config;

pub use reporter_config::{CloudMonitoringEnvConfig, ReporterEnvConfig};

use crate::domain::metric::PublishPolicy;
use anyhow::{Context, Result};
use std::time::Duration;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub project: String,
    pub base_url: String,
    pub access_token: Option<String>,
    pub enabled: bool,
    pub interval: Duration,
    pub policy: PublishPolicy,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let monitoring = CloudMonitoringEnvConfig::from_env();
        let reporter = ReporterEnvConfig::from_env().context("Failed to load reporter config")?;

        Ok(Self {
            project: monitoring.project,
            base_url: monitoring.base_url,
            access_token: monitoring.access_token,
            enabled: reporter.enabled,
            interval: Duration::from_secs(reporter.interval_secs),
            policy: reporter.policy,
        })
    }

    /// The project id, which every remote call needs.
    pub fn require_project(&self) -> Result<&str> {
        if self.project.is_empty() {
            anyhow::bail!("CLOUDMON_PROJECT is not set");
        }
        Ok(&self.project)
    }
}
