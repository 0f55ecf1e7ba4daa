//! Reporter configuration parsing from environment variables.

use crate::domain::metric::PublishPolicy;
use crate::infrastructure::cloud_monitoring::DEFAULT_BASE_URL;
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Cloud Monitoring connection settings
#[derive(Debug, Clone)]
pub struct CloudMonitoringEnvConfig {
    pub project: String,
    pub base_url: String,
    pub access_token: Option<String>,
}

impl CloudMonitoringEnvConfig {
    pub fn from_env() -> Self {
        Self {
            project: env::var("CLOUDMON_PROJECT").unwrap_or_default(),
            base_url: env::var("CLOUDMON_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            access_token: env::var("CLOUDMON_ACCESS_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
        }
    }
}

/// Publishing loop settings
#[derive(Debug, Clone)]
pub struct ReporterEnvConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub policy: PublishPolicy,
}

impl Default for ReporterEnvConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
            policy: PublishPolicy::FullBreakdown,
        }
    }
}

impl ReporterEnvConfig {
    pub fn from_env() -> Result<Self> {
        let interval_secs = env::var("CLOUDMON_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<u64>()
            .context("CLOUDMON_INTERVAL_SECS must be a whole number of seconds")?;
        if interval_secs == 0 {
            anyhow::bail!("CLOUDMON_INTERVAL_SECS must be greater than zero");
        }

        let policy_str = env::var("CLOUDMON_POLICY").unwrap_or_else(|_| "full".to_string());
        let enabled_str = env::var("CLOUDMON_ENABLED").unwrap_or_else(|_| "true".to_string());

        Ok(Self {
            enabled: parse_enabled(&enabled_str)?,
            interval_secs,
            policy: PublishPolicy::from_str(&policy_str)?,
        })
    }
}

fn parse_enabled(value: &str) -> Result<bool> {
    value
        .trim()
        .parse::<bool>()
        .with_context(|| format!("CLOUDMON_ENABLED must be 'true' or 'false', got '{}'", value))
}
