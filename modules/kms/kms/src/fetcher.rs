use std::sync::Arc;

use http::header::{ACCEPT, CONTENT_TYPE, HeaderName};
use http::{HeaderMap, HeaderValue};
use kms_sdk::{KmsError, NotFoundReason, Result, Secret};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::config::KmsConfig;
use crate::transport::{ReqwestTransport, SecretRequest, SecretTransport};

/// Header carrying the API token.
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Hook applied to the secret record before it is deserialized.
///
/// This is where a step using the configured `secret_key` would plug in.
/// The default [`PassthroughDecoder`] leaves the record untouched.
pub trait SecretDecoder: Send + Sync {
    /// # Errors
    /// Implementations return a `KmsError` when the record cannot be decoded.
    fn decode(&self, record: Value) -> Result<Value>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughDecoder;

impl SecretDecoder for PassthroughDecoder {
    fn decode(&self, record: Value) -> Result<Value> {
        Ok(record)
    }
}

/// Retrieves the first secret record from the key-management endpoint.
///
/// Every call to [`SecretFetcher::get_secret`] performs exactly one request.
/// Nothing is cached here; see [`crate::SecretCache`].
pub struct SecretFetcher<T = ReqwestTransport> {
    transport: T,
    url: String,
    token: SecretString,
    decoder: Arc<dyn SecretDecoder>,
}

impl SecretFetcher<ReqwestTransport> {
    /// Build a fetcher backed by a blocking `reqwest` client.
    ///
    /// # Errors
    /// Returns `KmsError::Config` if the HTTP client cannot be built.
    pub fn from_config(config: &KmsConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self::new(transport, config))
    }
}

impl<T: SecretTransport> SecretFetcher<T> {
    #[must_use]
    pub fn new(transport: T, config: &KmsConfig) -> Self {
        Self {
            transport,
            url: config.url.clone(),
            token: SecretString::from(config.token.expose_secret().to_owned()),
            decoder: Arc::new(PassthroughDecoder),
        }
    }

    #[must_use]
    pub fn with_decoder(mut self, decoder: Arc<dyn SecretDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Fetch the first secret of the response and deserialize it into `S`.
    ///
    /// # Errors
    /// - `KmsError::SecretNotFound` if the response holds no usable record
    /// - `KmsError::SecretParsing` if the body is not JSON or the record does
    ///   not match `S`
    /// - `KmsError::Http` for a non-success status
    /// - transport and configuration errors as produced by the transport
    pub fn get_secret<S: Secret>(&self) -> Result<S> {
        let request = self.build_request()?;

        tracing::debug!(url = %self.url, "Requesting secret from KMS");
        let response = self.transport.execute(&request)?;
        tracing::debug!(status = %response.status, "KMS responded");

        if !response.status.is_success() {
            return Err(KmsError::Http {
                status: response.status,
                body: response.body.unwrap_or_default(),
            });
        }

        let record = extract_secret_record(response.body.as_deref())?;
        let record = self.decoder.decode(record)?;
        let secret = serde_json::from_value(record)?;
        Ok(secret)
    }

    fn build_request(&self) -> Result<SecretRequest> {
        let mut token = HeaderValue::from_str(self.token.expose_secret())
            .map_err(|e| KmsError::Config(format!("invalid kms token header value: {e}")))?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(API_KEY_HEADER, token);

        Ok(SecretRequest::new(self.url.clone(), headers))
    }
}

/// Walk a response body down to its first secret record.
///
/// The expected shape is `[{"secrets": [<record>, ...]}, ...]`. Only the first
/// envelope and its first record are read.
///
/// # Errors
/// - `KmsError::SecretNotFound` when the body, the root, the `secrets` array
///   or the first record is absent or empty
/// - `KmsError::SecretParsing` when the body is not valid JSON
pub fn extract_secret_record(body: Option<&str>) -> Result<Value> {
    let body = match body {
        Some(body) if !body.trim().is_empty() => body,
        _ => return Err(KmsError::not_found(NotFoundReason::EmptyResponse)),
    };

    let root: Value = serde_json::from_str(body)?;
    if is_empty_node(&root) {
        return Err(KmsError::not_found(NotFoundReason::EmptyResponse));
    }
    let Some(root_record) = root.get(0) else {
        return Err(KmsError::not_found(NotFoundReason::EmptyResponse));
    };

    let secrets = match root_record.get("secrets") {
        Some(secrets) if !is_empty_node(secrets) => secrets,
        _ => return Err(KmsError::not_found(NotFoundReason::NoSecrets)),
    };

    match secrets.get(0) {
        Some(record) if !is_empty_node(record) => Ok(record.clone()),
        _ => Err(KmsError::not_found(NotFoundReason::EmptySecret)),
    }
}

/// A node is empty when it has no children: null, scalars, `[]` and `{}`.
fn is_empty_node(node: &Value) -> bool {
    match node {
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => true,
    }
}
