use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Marker for types that can be retrieved from the key-management endpoint.
///
/// The shape is owned by the caller. Any type that deserializes from the
/// first secret record of the response may opt in:
///
/// ```
/// use kms_sdk::Secret;
/// use serde::Deserialize;
///
/// #[derive(Debug, Clone, Deserialize)]
/// struct DatabaseCredentials {
///     username: String,
///     password: String,
/// }
///
/// impl Secret for DatabaseCredentials {}
/// ```
pub trait Secret: DeserializeOwned + Send + Sync + 'static {}

/// Untyped record, for callers without a static secret shape.
impl Secret for serde_json::Map<String, serde_json::Value> {}

/// Envelope returned by the key-management endpoint.
///
/// The live wire format wraps this envelope in an outer JSON array, and only
/// the first envelope and its first secret are ever read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KmsResponse<S> {
    pub id: String,
    pub service_id: String,
    pub environment: String,
    pub secrets: Vec<S>,
}

impl<S> KmsResponse<S> {
    #[must_use]
    pub fn first_secret(&self) -> Option<&S> {
        self.secrets.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_uses_camel_case_fields() {
        let envelope = KmsResponse {
            id: "1".to_owned(),
            service_id: "billing".to_owned(),
            environment: "prod".to_owned(),
            secrets: vec![json!({"k": "v"})],
        };

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["serviceId"], json!("billing"));
        assert_eq!(envelope.first_secret(), Some(&json!({"k": "v"})));
    }

    #[test]
    fn test_envelope_without_secrets() {
        let envelope: KmsResponse<serde_json::Value> = serde_json::from_value(json!({
            "id": "1",
            "serviceId": "billing",
            "environment": "dev",
            "secrets": []
        }))
        .unwrap();

        assert!(envelope.first_secret().is_none());
    }
}
