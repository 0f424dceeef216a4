use hub_core::Result;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

/// Runtime system configuration.
///
/// A nested JSON tree holding the mutable parts of the system config
/// (auth settings, default models, optional a2a section, secret key).
/// Loaded from a YAML file layered over built-in defaults and written back
/// on every update.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    values: Map<String, Value>,
    path: Option<PathBuf>,
}

impl ConfigStore {
    fn defaults() -> Map<String, Value> {
        let defaults = json!({
            "auth": {
                "http_auth_enabled": false,
                "username": "admin",
                "password": "",
            },
            "api": {},
        });
        match defaults {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    /// Create an in-memory store with default values, no persistence.
    pub fn new() -> Self {
        Self {
            values: Self::defaults(),
            path: None,
        }
    }

    /// Load the store from a YAML file, layered over defaults.
    ///
    /// A missing file yields the defaults; the file is created on the
    /// first update.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut values = Value::Object(Self::defaults());

        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let file_values: Value = serde_yaml::from_str(&content)
                .map_err(|e| hub_core::Error::Configuration(e.to_string()))?;
            deep_merge(&mut values, &file_values);
        }

        let values = match values {
            Value::Object(map) => map,
            _ => Self::defaults(),
        };

        Ok(Self {
            values,
            path: Some(path.to_path_buf()),
        })
    }

    fn save(&self) -> Result<()> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = serde_yaml::to_string(&Value::Object(self.values.clone()))
                .map_err(|e| hub_core::Error::Configuration(e.to_string()))?;
            std::fs::write(path, content)?;
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// A top-level section as an object, when it is one.
    pub fn section(&self, key: &str) -> Option<&Map<String, Value>> {
        self.values.get(key).and_then(Value::as_object)
    }

    pub fn secret_key(&self) -> Option<&str> {
        self.values.get("secret_key").and_then(Value::as_str)
    }

    /// Apply a patch and persist.
    ///
    /// With `overwrite` each top-level key replaces the existing value
    /// wholesale; otherwise each key is deep-merged into the tree,
    /// preserving untouched nested keys.
    pub fn update(&mut self, patch: Map<String, Value>, overwrite: bool) -> Result<()> {
        for (key, value) in patch {
            if overwrite {
                self.values.insert(key, value);
            } else {
                match self.values.get_mut(&key) {
                    Some(existing) => deep_merge(existing, &value),
                    None => {
                        self.values.insert(key, value);
                    }
                }
            }
        }
        self.save()
    }

    /// The read projection served by `GET /config`.
    pub fn projection(&self) -> Value {
        let http_auth_enabled = self
            .section("auth")
            .and_then(|auth| auth.get("http_auth_enabled"))
            .cloned()
            .unwrap_or(Value::Bool(false));

        let mut resp = Map::new();
        resp.insert("auth".to_string(), json!({"http_auth_enabled": http_auth_enabled}));

        for key in [
            "default_llm",
            "default_embedding_model",
            "default_reranking_model",
        ] {
            if let Some(value) = self.values.get(key) {
                resp.insert(key.to_string(), value.clone());
            }
        }

        if let Some(a2a) = self.section("api").and_then(|api| api.get("a2a")) {
            resp.insert("a2a".to_string(), a2a.clone());
        }

        Value::Object(resp)
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep-combine `src` into `dst`: objects merge recursively, anything else
/// replaces the destination value.
pub fn deep_merge(dst: &mut Value, src: &Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (key, src_value) in src_map {
                match dst_map.get_mut(key) {
                    Some(dst_value) => deep_merge(dst_value, src_value),
                    None => {
                        dst_map.insert(key.clone(), src_value.clone());
                    }
                }
            }
        }
        (dst, src) => *dst = src.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("patch must be an object"),
        }
    }

    #[test]
    fn test_merge_preserves_untouched_keys() {
        let mut store = ConfigStore::new();
        store
            .update(patch(json!({"auth": {"password": "s3cret"}})), false)
            .unwrap();

        let auth = store.section("auth").unwrap();
        assert_eq!(auth.get("password"), Some(&json!("s3cret")));
        // untouched sibling keys survive the merge
        assert_eq!(auth.get("http_auth_enabled"), Some(&json!(false)));
        assert_eq!(auth.get("username"), Some(&json!("admin")));
    }

    #[test]
    fn test_overwrite_replaces_wholesale() {
        let mut store = ConfigStore::new();
        store
            .update(
                patch(json!({"default_llm": {"provider": "openai", "model": "gpt-4"}})),
                true,
            )
            .unwrap();
        store
            .update(patch(json!({"default_llm": {"provider": "ollama"}})), true)
            .unwrap();

        // second overwrite fully replaces the first value
        assert_eq!(
            store.get("default_llm"),
            Some(&json!({"provider": "ollama"}))
        );
    }

    #[test]
    fn test_projection_skips_unset_keys() {
        let store = ConfigStore::new();
        let resp = store.projection();

        assert_eq!(resp["auth"]["http_auth_enabled"], json!(false));
        assert!(resp.get("default_llm").is_none());
        assert!(resp.get("a2a").is_none());
    }

    #[test]
    fn test_projection_includes_a2a_when_present() {
        let mut store = ConfigStore::new();
        store
            .update(patch(json!({"api": {"a2a": {"host": "0.0.0.0", "port": 47338}}})), false)
            .unwrap();

        let resp = store.projection();
        assert_eq!(resp["a2a"]["port"], json!(47338));
    }

    #[test]
    fn test_load_and_persist_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut store = ConfigStore::load(&path).unwrap();
        store
            .update(patch(json!({"secret_key": "top-secret"})), false)
            .unwrap();

        let reloaded = ConfigStore::load(&path).unwrap();
        assert_eq!(reloaded.secret_key(), Some("top-secret"));
        // defaults still layered underneath
        assert!(reloaded.section("auth").is_some());
    }
}
