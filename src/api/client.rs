use crate::api::parser::{self, ProvisionReceipt, ProvisionRequest};
use crate::app::PipelineSnapshot;
use async_trait::async_trait;
use color_eyre::eyre::{eyre, Result};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// The status query seam the polling session depends on, so the loop can be
/// driven by a scripted source in tests. One call is one query: no internal
/// retry — retry policy belongs to the session's backoff.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Resolve to a normalized snapshot, or fail with a single retryable
    /// "query failed" error. Transport failures and application-level
    /// `success: false` are not distinguished structurally.
    async fn fetch_status(&self, project_id: u64, pipeline_id: u64) -> Result<PipelineSnapshot>;
}

/// HTTP client for the operator backend.
pub struct StatusClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl StatusClient {
    pub fn new(base_url: &str, token: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| eyre!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Submit a provisioning request; on success the returned receipt
    /// carries the (project, pipeline) pair to start watching.
    pub async fn submit(&self, request: &ProvisionRequest) -> Result<ProvisionReceipt> {
        let url = format!("{}/api/deploy", self.base_url);
        tracing::debug!("POST {url}");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await
            .map_err(|e| eyre!("provisioning request failed: {e}"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| eyre!("provisioning request failed: {e}"))?;
        if !status.is_success() {
            return Err(eyre!("provisioning request failed: {status}: {}", body.trim()));
        }
        parser::parse_submit(&body)
    }
}

#[async_trait]
impl StatusSource for StatusClient {
    async fn fetch_status(&self, project_id: u64, pipeline_id: u64) -> Result<PipelineSnapshot> {
        let url = format!(
            "{}/api/pipeline_status/{project_id}/{pipeline_id}",
            self.base_url
        );
        tracing::debug!("GET {url}");
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| eyre!("status query failed: {e}"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| eyre!("status query failed: {e}"))?;
        if !status.is_success() {
            return Err(eyre!("status query failed: {status}: {}", body.trim()));
        }
        parser::parse_status(&body)
    }
}
