//! Remote generation service client
//!
//! [`GenerationService`] is the seam between the orchestrator and the
//! network. [`HttpGenerationClient`] is the production implementation;
//! tests substitute scripted services.

use async_trait::async_trait;

use crate::api::{JobStatusResponse, SubmitRequest, SubmitResponse};
use crate::config::GenerationConfig;
use crate::error::{GenerationError, Result};

/// Operations the orchestrator needs from the generation service
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Submit a job and return its ID
    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitResponse>;

    /// Query the status of a job
    async fn status(&self, job_id: &str) -> Result<JobStatusResponse>;

    /// Approve a job waiting for review
    async fn approve(&self, job_id: &str) -> Result<()>;

    /// Cancel a job remotely
    ///
    /// Services without a cancellation endpoint keep the default no-op.
    async fn cancel(&self, job_id: &str) -> Result<()> {
        log::debug!("Remote cancellation not supported, job {} left running", job_id);
        Ok(())
    }
}

/// HTTP client for the generation service
pub struct HttpGenerationClient {
    /// HTTP client for API requests
    http_client: reqwest::Client,
    /// Base URL without trailing slash
    base_url: String,
}

impl HttpGenerationClient {
    /// Create a client for the configured service
    pub fn new(config: &GenerationConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config.api_root())
    }

    /// Create a client reusing an existing reqwest client
    pub fn with_client(http_client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http_client,
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint URL with each segment percent-encoded
    fn url(&self, segments: &[&str]) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            GenerationError::Config(format!("invalid base_url {:?}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                GenerationError::Config(format!("base_url {:?} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Turn non-success responses into API errors carrying the body
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = if body.is_empty() {
            status.canonical_reason().unwrap_or("unknown error").to_string()
        } else {
            body
        };
        Err(GenerationError::api(status.as_u16(), message))
    }
}

#[async_trait]
impl GenerationService for HttpGenerationClient {
    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitResponse> {
        let response = self
            .http_client
            .post(self.url(&["generate"])?)
            .json(request)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn status(&self, job_id: &str) -> Result<JobStatusResponse> {
        let response = self
            .http_client
            .get(self.url(&["jobs", job_id])?)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn approve(&self, job_id: &str) -> Result<()> {
        let response = self
            .http_client
            .post(self.url(&["jobs", job_id, "approve"])?)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn cancel(&self, job_id: &str) -> Result<()> {
        let response = self
            .http_client
            .post(self.url(&["jobs", job_id, "cancel"])?)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
