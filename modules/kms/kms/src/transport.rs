use std::time::Duration;

use http::{HeaderMap, StatusCode};
use kms_sdk::{KmsError, Result};

/// A GET request for the secret endpoint.
#[derive(Debug, Clone)]
pub struct SecretRequest {
    url: String,
    headers: HeaderMap,
}

impl SecretRequest {
    #[must_use]
    pub fn new(url: String, headers: HeaderMap) -> Self {
        Self { url, headers }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Status and body as received from the endpoint.
///
/// `body` is `None` when the transport produced no body at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: Option<String>,
}

/// Synchronous HTTP capability required by the fetcher.
pub trait SecretTransport: Send + Sync {
    /// Perform one GET round trip.
    ///
    /// # Errors
    /// Returns `KmsError::Connection`, `KmsError::Timeout` or
    /// `KmsError::Transport` when no response could be obtained.
    fn execute(&self, request: &SecretRequest) -> Result<TransportResponse>;
}

/// Blocking `reqwest` client.
pub struct ReqwestTransport {
    http_client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Create a transport. Without a timeout the `reqwest` default applies.
    ///
    /// # Errors
    /// Returns `KmsError::Config` if the HTTP client cannot be built.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| KmsError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http_client })
    }
}

impl SecretTransport for ReqwestTransport {
    fn execute(&self, request: &SecretRequest) -> Result<TransportResponse> {
        let resp = self
            .http_client
            .get(request.url())
            .headers(request.headers().clone())
            .send()
            .map_err(map_reqwest_error)?;

        let status = resp.status();
        let body = resp.text().map_err(map_reqwest_error)?;

        Ok(TransportResponse {
            status,
            body: Some(body),
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> KmsError {
    if e.is_timeout() {
        KmsError::Timeout(e.to_string())
    } else if e.is_connect() {
        KmsError::Connection(e.to_string())
    } else {
        KmsError::Transport(e.to_string())
    }
}
