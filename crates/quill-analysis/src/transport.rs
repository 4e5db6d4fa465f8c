//! Transport abstraction for the remote analysis endpoint

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::report::Report;

/// Transport for running analysis requests
#[async_trait]
pub trait AnalysisTransport: Send + Sync {
    /// Run one analysis request. Must respect `cancel` promptly; a
    /// cancelled request resolves to [`Error::Aborted`].
    async fn analyze(&self, text: &str, cancel: CancellationToken) -> Result<Report>;
}

/// Direct HTTP transport for the analysis service
pub struct HttpAnalysisTransport {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpAnalysisTransport {
    /// Create a transport for a service base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            auth_token: None,
        }
    }

    /// Attach a bearer token for authenticated checks
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    async fn send(&self, text: &str) -> Result<Report> {
        let url = format!("{}/v1/analysis", self.base_url.trim_end_matches('/'));
        let mut request = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "text": text }));
        if let Some(ref token) = self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Unauthorized);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::PAYMENT_REQUIRED
        {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::QuotaExceeded { message });
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            return Err(Error::api(
                status.canonical_reason().unwrap_or("error"),
                message,
            ));
        }

        Ok(response.json::<Report>().await?)
    }
}

#[async_trait]
impl AnalysisTransport for HttpAnalysisTransport {
    async fn analyze(&self, text: &str, cancel: CancellationToken) -> Result<Report> {
        tokio::select! {
            _ = cancel.cancelled() => Err(Error::Aborted),
            result = self.send(text) => result,
        }
    }
}
