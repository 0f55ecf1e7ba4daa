use super::wire::{ListMetricDescriptorsResponse, WireMetricDescriptor, WriteTimeseriesRequest};
use crate::domain::descriptor::{MetricDescriptor, TimeseriesPoint};
use crate::domain::errors::{MonitoringError, MonitoringResult};
use crate::domain::ports::MonitoringService;
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, HttpClientSettings};
use async_trait::async_trait;
use reqwest_middleware::{ClientWithMiddleware, RequestBuilder};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/cloudmonitoring/v2beta2";

/// Cloud Monitoring REST client bound to one project.
pub struct CloudMonitoringClient {
    client: ClientWithMiddleware,
    base_url: Url,
    project: String,
    access_token: Option<String>,
}

impl CloudMonitoringClient {
    /// Build a client with the shared retrying HTTP stack.
    ///
    /// This is the only fatal failure of the reporting path: nothing can be
    /// published without a client.
    pub fn new(
        base_url: &str,
        project: impl Into<String>,
        access_token: Option<String>,
        settings: &HttpClientSettings,
    ) -> MonitoringResult<Self> {
        let client = HttpClientFactory::create_client(settings)?;
        Self::with_client(client, base_url, project, access_token)
    }

    pub fn with_client(
        client: ClientWithMiddleware,
        base_url: &str,
        project: impl Into<String>,
        access_token: Option<String>,
    ) -> MonitoringResult<Self> {
        let project = project.into();
        if project.is_empty() {
            return Err(MonitoringError::ClientSetup {
                reason: "project id is empty".to_string(),
            });
        }
        let base_url = Url::parse(base_url).map_err(|e| MonitoringError::ClientSetup {
            reason: format!("invalid base url {}: {}", base_url, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(MonitoringError::ClientSetup {
                reason: format!("base url {} cannot carry a path", base_url),
            });
        }

        Ok(Self {
            client,
            base_url,
            project,
            access_token,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// `{base}/projects/{project}/{segments...}`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .push("projects")
                .push(&self.project)
                .extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn json_body<T: Serialize>(operation: &'static str, body: &T) -> MonitoringResult<String> {
        serde_json::to_string(body).map_err(|e| MonitoringError::Decode {
            operation,
            reason: format!("failed to serialize request: {}", e),
        })
    }

    /// Send and map the outcome: send failure -> Transport, non-2xx -> RemoteService.
    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> MonitoringResult<String> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| MonitoringError::Transport {
                operation,
                source: Box::new(e),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MonitoringError::Transport {
                operation,
                source: Box::new(e),
            })?;

        if !status.is_success() {
            return Err(MonitoringError::RemoteService {
                operation,
                status: status.as_u16(),
                body,
            });
        }

        debug!(
            "CloudMonitoringClient: {} succeeded (HTTP {})",
            operation,
            status.as_u16()
        );
        Ok(body)
    }
}

#[async_trait]
impl MonitoringService for CloudMonitoringClient {
    async fn create_descriptor(&self, descriptor: &MetricDescriptor) -> MonitoringResult<()> {
        const OP: &str = "create_descriptor";
        let body = Self::json_body(OP, &WireMetricDescriptor::from(descriptor))?;
        let request = self
            .client
            .post(self.endpoint(&["metricDescriptors"]))
            .header("Content-Type", "application/json")
            .body(body);

        self.execute(OP, request).await?;
        Ok(())
    }

    async fn delete_descriptor(&self, name: &str) -> MonitoringResult<()> {
        let request = self
            .client
            .delete(self.endpoint(&["metricDescriptors", name]));

        self.execute("delete_descriptor", request).await?;
        Ok(())
    }

    async fn list_descriptors(&self) -> MonitoringResult<Vec<MetricDescriptor>> {
        const OP: &str = "list_descriptors";
        let mut descriptors = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();

        loop {
            let mut url = self.endpoint(&["metricDescriptors"]);
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            let body = self.execute(OP, self.client.get(url)).await?;
            let page: ListMetricDescriptorsResponse =
                serde_json::from_str(&body).map_err(|e| MonitoringError::Decode {
                    operation: OP,
                    reason: format!("{}. Body: {}", e, body),
                })?;

            descriptors.extend(page.metrics.into_iter().map(|m| m.into_domain()));

            match page.next_page_token {
                Some(token) if !token.is_empty() => {
                    if !seen_tokens.insert(token.clone()) {
                        return Err(MonitoringError::Decode {
                            operation: OP,
                            reason: format!("page token {} returned twice", token),
                        });
                    }
                    page_token = Some(token);
                }
                _ => break,
            }
        }

        Ok(descriptors)
    }

    async fn write_timeseries(&self, points: &[TimeseriesPoint]) -> MonitoringResult<()> {
        const OP: &str = "write_timeseries";
        let body = Self::json_body(OP, &WriteTimeseriesRequest::from_points(points))?;
        let request = self
            .client
            .post(self.endpoint(&["timeseries:write"]))
            .header("Content-Type", "application/json")
            .body(body);

        self.execute(OP, request).await?;
        Ok(())
    }
}
