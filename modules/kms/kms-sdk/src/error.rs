use http::StatusCode;

/// Why a response did not yield a secret record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// The body was absent or blank, or the JSON root had no first element.
    EmptyResponse,
    /// The root record has no `secrets` field, or it is empty.
    NoSecrets,
    /// The first entry of `secrets` is missing or empty.
    EmptySecret,
}

impl NotFoundReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmptyResponse => "Empty response from API",
            Self::NoSecrets => "No secrets found in response",
            Self::EmptySecret => "Secret not found or empty",
        }
    }
}

impl std::fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the kms module.
///
/// Every failure is terminal for the call that produced it. Nothing in the
/// module retries; that is left to the caller.
#[derive(Debug, thiserror::Error)]
pub enum KmsError {
    #[error("{0}")]
    SecretNotFound(NotFoundReason),

    /// The body was not valid JSON, or the secret record does not match the
    /// requested type.
    #[error("Failed to parse secret response")]
    SecretParsing {
        #[source]
        source: serde_json::Error,
    },

    /// The cache was read before anything was stored in it.
    #[error("Secret not stored")]
    NotStored,

    #[error("HTTP error: status={status}")]
    Http { status: StatusCode, body: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl KmsError {
    #[must_use]
    pub fn not_found(reason: NotFoundReason) -> Self {
        Self::SecretNotFound(reason)
    }

    /// Returns the not-found reason, if this is a `SecretNotFound` error.
    #[must_use]
    pub fn not_found_reason(&self) -> Option<NotFoundReason> {
        match self {
            Self::SecretNotFound(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for KmsError {
    fn from(source: serde_json::Error) -> Self {
        Self::SecretParsing { source }
    }
}

pub type Result<T> = std::result::Result<T, KmsError>;
