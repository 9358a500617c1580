//! Gemini bridge: one `generateContent` call per question.
//!
//! The [`Upstream`] trait is the seam between the tutor pipeline and the network. Status codes and
//! bodies come back raw; [`crate::interpret`] decides what they mean.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::{DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use crate::error::UpstreamError;
use crate::interpret::preview;
use crate::payload::UpstreamRequest;
use crate::TutorConfig;

/// Raw HTTP result of an upstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait Upstream: Send + Sync {
    async fn generate(&self, request: &UpstreamRequest) -> Result<UpstreamReply, UpstreamError>;
}

pub struct GeminiClient {
    api_key: String,
    api_base: String,
    model: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Client against the public endpoint with the default model and timeout.
    pub fn new(api_key: String) -> Self {
        Self::build(api_key, DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS)
    }

    pub fn from_config(config: &TutorConfig, api_key: String) -> Self {
        Self::build(
            api_key,
            &config.api_base,
            &config.model,
            config.request_timeout_secs,
        )
    }

    fn build(api_key: String, api_base: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: api_key.trim().to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout_secs,
            client,
        }
    }

    /// `{api_base}/models/{model}:generateContent`. The key travels in a header, never the URL.
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    fn map_err(&self, e: reqwest::Error) -> UpstreamError {
        if e.is_timeout() {
            UpstreamError::Timeout(self.timeout_secs)
        } else {
            UpstreamError::Transport(e)
        }
    }
}

#[async_trait]
impl Upstream for GeminiClient {
    async fn generate(&self, request: &UpstreamRequest) -> Result<UpstreamReply, UpstreamError> {
        let url = self.endpoint();
        let payload = request.to_json();
        tracing::info!(target: "aitutor::upstream", url = %url, bytes = payload.len(), "calling Gemini");
        tracing::debug!(target: "aitutor::upstream", payload = %preview(&payload, 100), "payload");

        let res = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .body(payload)
            .send()
            .await
            .map_err(|e| self.map_err(e))?;

        let status = res.status().as_u16();
        let body = res.text().await.map_err(|e| self.map_err(e))?;
        tracing::info!(target: "aitutor::upstream", status, "Gemini responded");
        tracing::debug!(target: "aitutor::upstream", body = %preview(&body, 200), "raw response");

        Ok(UpstreamReply { status, body })
    }
}
