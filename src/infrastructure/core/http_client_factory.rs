use crate::domain::errors::{MonitoringError, MonitoringResult};
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;

/// Settings for the shared HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientSettings {
    pub max_retries: u32,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for HttpClientSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Creates a new HTTP client with retry middleware
    pub fn create_client(settings: &HttpClientSettings) -> MonitoringResult<ClientWithMiddleware> {
        // Transient failures (5xx, 408, 429, connection errors) are retried
        // with exponential backoff.
        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(settings.max_retries);

        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(settings.timeout)
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|e| MonitoringError::ClientSetup {
                reason: e.to_string(),
            })?;

        Ok(ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build())
    }
}
