use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const REDACTED: &str = "******";

/// Param keys treated as secrets when listing integrations.
const SECRET_KEY_MARKERS: &[&str] = &["password", "secret", "token", "api_key", "private_key"];

/// A registered integration connector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationEntry {
    /// Unique name for this integration
    pub name: String,

    /// Engine identifier (e.g. "postgres", "nats")
    pub engine: String,

    /// Engine-specific params, may contain secrets
    pub params: Value,

    /// Whether this integration is published
    #[serde(default)]
    pub publish: bool,

    /// When this integration was created
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// When this integration was last updated
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl IntegrationEntry {
    pub fn new(name: String, engine: String, params: Value) -> Self {
        let now = Utc::now();
        Self {
            name,
            engine,
            params,
            publish: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// A copy safe for listing: secret-looking param values are masked.
    pub fn redacted(&self) -> Self {
        let mut entry = self.clone();
        if let Value::Object(params) = &mut entry.params {
            for (key, value) in params.iter_mut() {
                let key = key.to_lowercase();
                if SECRET_KEY_MARKERS.iter().any(|marker| key.contains(marker)) {
                    *value = Value::String(REDACTED.to_string());
                }
            }
        }
        entry
    }
}

/// Interpret a param value as a flag.
///
/// Form-encoded requests deliver booleans as strings, so "true"/"1" count
/// alongside real booleans and non-zero numbers.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => {
            let s = s.to_lowercase();
            s == "true" || s == "1" || s == "yes" || s == "on"
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redaction_masks_secret_params() {
        let entry = IntegrationEntry::new(
            "pg".to_string(),
            "postgres".to_string(),
            json!({"host": "db", "password": "hunter2", "api_key": "k"}),
        );

        let redacted = entry.redacted();
        assert_eq!(redacted.params["host"], json!("db"));
        assert_eq!(redacted.params["password"], json!("******"));
        assert_eq!(redacted.params["api_key"], json!("******"));
        // original untouched
        assert_eq!(entry.params["password"], json!("hunter2"));
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!("true")));
        assert!(is_truthy(&json!("1")));
        assert!(is_truthy(&json!(1)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!("false")));
        assert!(!is_truthy(&json!("0")));
        assert!(!is_truthy(&json!(null)));
    }
}
