//! Remote client for a running `realeffectd`.
//!
//! Transport failures (connection refused, timeouts, gateway errors) are
//! retried with exponential backoff. Errors reported by the service itself
//! are returned immediately: retrying an invalid spec cannot succeed.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use realeffect_core::EvaluationResult;
use thiserror::Error;

use crate::backend::EvaluationBackend;
use crate::protocol::{EvaluationRequest, EvaluationResponse};
use crate::ServiceError;

/// Errors from the remote client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("spec_path must not be empty")]
    EmptySpecPath,

    #[error("spec text must not be empty")]
    EmptySpec,

    #[error("could not connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("could not decode service response: {0}")]
    Decode(String),

    #[error("service reported an error: {0}")]
    Service(String),
}

impl ClientError {
    /// Whether repeating the same request might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Connect { .. } | ClientError::Timeout(_) => true,
            ClientError::Status { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }
}

/// Configuration for [`RemoteClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Service base URL (e.g., "http://127.0.0.1:8081")
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Retries after the first attempt for transient failures
    pub max_retries: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8081".to_string(),
            timeout: Duration::from_secs(15),
            max_retries: 3,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Client for the `POST /evaluate` endpoint.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    base_url: String,
    http: reqwest::Client,
    timeout: Duration,
    max_retries: usize,
}

impl RemoteClient {
    /// Create a client with its own connection pool.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Http(e.to_string()))?;

        Ok(Self::with_http_client(config, http))
    }

    /// Create a client that reuses an existing reqwest client.
    pub fn with_http_client(config: ClientConfig, http: reqwest::Client) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            timeout: config.timeout,
            max_retries: config.max_retries,
        }
    }

    /// Evaluate a mission file that the service can read.
    ///
    /// The path is sent as given and resolved by the service.
    pub async fn evaluate_from_file(
        &self,
        spec_path: &str,
        scenario: &str,
    ) -> Result<EvaluationResult, ClientError> {
        if spec_path.trim().is_empty() {
            return Err(ClientError::EmptySpecPath);
        }
        self.send(&EvaluationRequest::from_path(spec_path, scenario))
            .await
    }

    /// Evaluate inline mission spec text.
    pub async fn evaluate_text(
        &self,
        spec: &str,
        scenario: &str,
    ) -> Result<EvaluationResult, ClientError> {
        if spec.trim().is_empty() {
            return Err(ClientError::EmptySpec);
        }
        self.send(&EvaluationRequest::from_text(spec, scenario))
            .await
    }

    /// Send a request, retrying transient failures.
    pub async fn send(&self, request: &EvaluationRequest) -> Result<EvaluationResult, ClientError> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_secs(2))
            .with_max_times(self.max_retries);

        (|| self.send_once(request))
            .retry(backoff)
            .when(ClientError::is_transient)
            .notify(|err: &ClientError, delay: Duration| {
                tracing::warn!(error = %err, retry_in = ?delay, "evaluation request failed, retrying");
            })
            .await
    }

    /// Check that the service answers its health endpoint.
    pub async fn health_check(&self) -> bool {
        match self.http.get(format!("{}/health", self.base_url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn send_once(&self, request: &EvaluationRequest) -> Result<EvaluationResult, ClientError> {
        let url = format!("{}/evaluate", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(&url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(&url, e))?;

        match serde_json::from_str::<EvaluationResponse>(&body) {
            Ok(decoded) => decoded.into_result().map_err(ClientError::Service),
            Err(_) if !status.is_success() => Err(ClientError::Status {
                status: status.as_u16(),
                message: body.trim().to_string(),
            }),
            Err(e) => Err(ClientError::Decode(e.to_string())),
        }
    }

    fn transport_error(&self, url: &str, error: reqwest::Error) -> ClientError {
        if error.is_timeout() {
            ClientError::Timeout(self.timeout)
        } else if error.is_connect() {
            ClientError::Connect {
                url: url.to_string(),
                message: error.to_string(),
            }
        } else {
            ClientError::Http(error.to_string())
        }
    }
}

#[async_trait]
impl EvaluationBackend for RemoteClient {
    async fn evaluate(&self, request: EvaluationRequest) -> Result<EvaluationResult, ServiceError> {
        Ok(self.send(&request).await?)
    }

    fn name(&self) -> &str {
        "remote"
    }
}
