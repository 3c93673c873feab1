use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use kms_sdk::{KmsError, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

/// Prefix of the environment variables read by [`KmsConfig::load`].
pub const ENV_PREFIX: &str = "KMS_";

/// Configuration for the kms module.
///
/// Loaded once at startup and treated as read-only afterwards.
#[derive(Deserialize)]
pub struct KmsConfig {
    /// Whether the module is wired at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Endpoint queried with a single GET.
    pub url: String,

    /// API token sent in the `x-api-key` header.
    #[serde(deserialize_with = "deserialize_secret")]
    pub token: SecretString,

    /// Reserved for decoding the retrieved record; not read by the fetch path.
    #[serde(default, deserialize_with = "deserialize_optional_secret")]
    pub secret_key: Option<SecretString>,

    /// Request timeout in milliseconds. The HTTP client default applies when unset.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_enabled() -> bool {
    true
}

/// Secret value that also accepts scalars.
///
/// Env and YAML providers type all-digit or boolean values, so a token such as
/// `12345` arrives as a number and is turned back into its string form.
struct ScalarSecret(SecretString);

impl<'de> Deserialize<'de> for ScalarSecret {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ScalarSecretVisitor)
    }
}

struct ScalarSecretVisitor;

impl Visitor<'_> for ScalarSecretVisitor {
    type Value = ScalarSecret;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a string, number or boolean secret value")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
        Ok(ScalarSecret(SecretString::from(v.to_owned())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Self::Value, E> {
        Ok(ScalarSecret(SecretString::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
        self.visit_string(v.to_string())
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> std::result::Result<Self::Value, E> {
        self.visit_string(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
        self.visit_string(v.to_string())
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> std::result::Result<Self::Value, E> {
        self.visit_string(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Self::Value, E> {
        self.visit_string(v.to_string())
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Self::Value, E> {
        self.visit_string(v.to_string())
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    ScalarSecret::deserialize(deserializer).map(|s| s.0)
}

fn deserialize_optional_secret<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ScalarSecret>::deserialize(deserializer)?.map(|s| s.0))
}

impl std::fmt::Debug for KmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KmsConfig")
            .field("enabled", &self.enabled)
            .field("url", &self.url)
            .field("token", &"[REDACTED]")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl KmsConfig {
    /// Create an enabled configuration for the given endpoint and token.
    #[must_use]
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            enabled: true,
            url: url.into(),
            token: SecretString::from(token.into()),
            secret_key: None,
            timeout_ms: None,
        }
    }

    /// Set the key reserved for decoding retrieved records.
    #[must_use]
    pub fn with_secret_key(mut self, secret_key: impl Into<String>) -> Self {
        self.secret_key = Some(SecretString::from(secret_key.into()));
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Load configuration from an optional YAML file and `KMS_*` environment
    /// variables. Environment values override the file.
    ///
    /// Recognized variables: `KMS_ENABLED`, `KMS_URL`, `KMS_TOKEN`,
    /// `KMS_SECRET_KEY`, `KMS_TIMEOUT_MS`.
    ///
    /// # Errors
    /// Returns `KmsError::Config` if a required value is missing or a value
    /// has the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| KmsError::Config(format!("failed to load kms configuration: {e}")))
    }

    /// Check that the endpoint and token are usable.
    ///
    /// # Errors
    /// Returns `KmsError::Config` for a blank or unparsable `url`, or a blank
    /// `token`.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(KmsError::Config("kms url must not be blank".into()));
        }
        url::Url::parse(&self.url)
            .map_err(|e| KmsError::Config(format!("invalid kms url '{}': {e}", self.url)))?;
        if self.token.expose_secret().trim().is_empty() {
            return Err(KmsError::Config("kms token must not be blank".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    #[must_use]
    pub fn secret_key(&self) -> Option<&SecretString> {
        self.secret_key.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let config = KmsConfig::new("https://kms.example.com/secrets", "token-1");
        assert!(config.enabled);
        assert_eq!(config.token.expose_secret(), "token-1");
        assert!(config.secret_key().is_none());
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_builder_setters() {
        let config = KmsConfig::new("https://kms.example.com", "t")
            .with_secret_key("k")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.secret_key().map(|k| k.expose_secret()), Some("k"));
        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_validate_rejects_blank_url() {
        let err = KmsConfig::new("  ", "t").validate().unwrap_err();
        assert!(matches!(err, KmsError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_relative_url() {
        let err = KmsConfig::new("/secrets", "t").validate().unwrap_err();
        assert!(matches!(err, KmsError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_blank_token() {
        let err = KmsConfig::new("https://kms.example.com", "").validate().unwrap_err();
        assert!(matches!(err, KmsError::Config(_)));
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(KmsConfig::new("https://kms.example.com", "t").validate().is_ok());
    }

    #[test]
    fn test_numeric_and_boolean_secrets_are_read_as_strings() {
        let config: KmsConfig = serde_json::from_value(serde_json::json!({
            "url": "https://kms.example.com",
            "token": 12345,
            "secret_key": true
        }))
        .unwrap();

        assert_eq!(config.token.expose_secret(), "12345");
        assert_eq!(config.secret_key().map(|k| k.expose_secret()), Some("true"));
    }

    #[test]
    fn test_secret_rejects_structured_values() {
        let result = serde_json::from_value::<KmsConfig>(serde_json::json!({
            "url": "https://kms.example.com",
            "token": ["a", "b"]
        }));

        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let config = KmsConfig::new("https://kms.example.com", "super-token").with_secret_key("key-1");
        let rendered = format!("{config:?}");

        assert!(!rendered.contains("super-token"));
        assert!(!rendered.contains("key-1"));
        assert!(rendered.contains("https://kms.example.com"));
    }
}
