use crate::models::IntegrationEntry;
use chrono::Utc;
use hub_core::{Error, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Store for integration entries, keyed by unique name.
///
/// Persists to `integrations.yaml` in the storage directory after every
/// mutation; an in-memory store (no persistence) is used in tests.
#[derive(Debug, Clone)]
pub struct IntegrationStore {
    entries: HashMap<String, IntegrationEntry>,
    path: Option<PathBuf>,
}

impl IntegrationStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            path: None,
        }
    }

    /// Load the store from a storage directory
    pub fn load(storage_dir: impl AsRef<Path>) -> Result<Self> {
        let path = storage_dir.as_ref().join("integrations.yaml");
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let list: Vec<IntegrationEntry> = serde_yaml::from_str(&content)
                .map_err(|e| Error::Configuration(e.to_string()))?;
            list.into_iter().map(|e| (e.name.clone(), e)).collect()
        } else {
            HashMap::new()
        };

        Ok(Self {
            entries,
            path: Some(path),
        })
    }

    fn save(&self) -> Result<()> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut list: Vec<_> = self.entries.values().cloned().collect();
            list.sort_by(|a, b| a.name.cmp(&b.name));
            let content = serde_yaml::to_string(&list)
                .map_err(|e| Error::Configuration(e.to_string()))?;
            std::fs::write(path, content)?;
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn add(&mut self, entry: IntegrationEntry) -> Result<()> {
        if self.entries.contains_key(&entry.name) {
            return Err(Error::AlreadyExists(entry.name));
        }
        self.entries.insert(entry.name.clone(), entry);
        self.save()
    }

    /// Merge a param patch into an existing entry.
    ///
    /// Top-level param keys are replaced; the `publish` flag is handled by
    /// the controller before it reaches here.
    pub fn modify(&mut self, name: &str, params: Map<String, Value>) -> Result<()> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;

        if !params.is_empty() {
            match &mut entry.params {
                Value::Object(existing) => {
                    for (key, value) in params {
                        existing.insert(key, value);
                    }
                }
                other => *other = Value::Object(params),
            }
        }
        entry.updated_at = Utc::now();
        self.save()
    }

    pub fn set_publish(&mut self, name: &str, publish: bool) -> Result<()> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        entry.publish = publish;
        entry.updated_at = Utc::now();
        self.save()
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.entries
            .remove(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        self.save()
    }

    pub fn get(&self, name: &str, show_secrets: bool) -> Option<IntegrationEntry> {
        self.entries.get(name).map(|entry| {
            if show_secrets {
                entry.clone()
            } else {
                entry.redacted()
            }
        })
    }

    pub fn get_all(&self, show_secrets: bool) -> Vec<IntegrationEntry> {
        let mut list: Vec<_> = self
            .entries
            .values()
            .map(|entry| {
                if show_secrets {
                    entry.clone()
                } else {
                    entry.redacted()
                }
            })
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for IntegrationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(name: &str) -> IntegrationEntry {
        IntegrationEntry::new(
            name.to_string(),
            "postgres".to_string(),
            json!({"host": "db", "password": "pw"}),
        )
    }

    #[test]
    fn test_add_duplicate_fails_and_keeps_original() {
        let mut store = IntegrationStore::new();
        store.add(entry("pg")).unwrap();

        let mut dup = entry("pg");
        dup.params = json!({"host": "other"});
        assert!(matches!(store.add(dup), Err(Error::AlreadyExists(_))));

        // original record untouched
        let kept = store.get("pg", true).unwrap();
        assert_eq!(kept.params["host"], json!("db"));
    }

    #[test]
    fn test_delete_missing_fails() {
        let mut store = IntegrationStore::new();
        assert!(matches!(store.delete("ghost"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_modify_merges_params() {
        let mut store = IntegrationStore::new();
        store.add(entry("pg")).unwrap();

        let patch = match json!({"host": "replica"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        store.modify("pg", patch).unwrap();

        let updated = store.get("pg", true).unwrap();
        assert_eq!(updated.params["host"], json!("replica"));
        assert_eq!(updated.params["password"], json!("pw"));
    }

    #[test]
    fn test_get_redacts_secrets_by_default() {
        let mut store = IntegrationStore::new();
        store.add(entry("pg")).unwrap();

        let redacted = store.get("pg", false).unwrap();
        assert_eq!(redacted.params["password"], json!("******"));
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();

        let mut store = IntegrationStore::load(dir.path()).unwrap();
        store.add(entry("pg")).unwrap();

        let reloaded = IntegrationStore::load(dir.path()).unwrap();
        assert_eq!(reloaded.names(), vec!["pg".to_string()]);
    }
}
