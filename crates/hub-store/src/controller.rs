use crate::models::{is_truthy, IntegrationEntry};
use crate::store::IntegrationStore;
use hub_core::{resolve_within, FileStorage, Handler, Registry, Result};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Orchestrates the integration lifecycle: the persisted store, the engine
/// registry, and per-integration handler storage directories.
pub struct IntegrationController {
    store: IntegrationStore,
    registry: Arc<Registry>,
    data_dir: PathBuf,
}

impl IntegrationController {
    pub fn new(store: IntegrationStore, registry: Arc<Registry>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            registry,
            data_dir: data_dir.into(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn exists(&self, name: &str) -> bool {
        self.store.contains(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.store.names()
    }

    pub fn get(&self, name: &str, show_secrets: bool) -> Option<IntegrationEntry> {
        self.store.get(name, show_secrets)
    }

    pub fn get_all(&self, show_secrets: bool) -> Vec<IntegrationEntry> {
        self.store.get_all(show_secrets)
    }

    /// Register a new integration.
    ///
    /// The engine must be known to the registry; duplicate names are
    /// rejected before anything is written.
    pub fn add(&mut self, name: &str, engine: &str, params: Value) -> Result<()> {
        if self.store.contains(name) {
            return Err(hub_core::Error::AlreadyExists(name.to_string()));
        }
        self.registry.get_factory(engine)?;
        self.store
            .add(IntegrationEntry::new(name.to_string(), engine.to_string(), params))
    }

    /// Apply a param patch to an existing integration.
    ///
    /// A `publish` key in the patch toggles the publish flag instead of
    /// landing in params.
    pub fn modify(&mut self, name: &str, mut params: Map<String, Value>) -> Result<()> {
        if let Some(publish) = params.remove("publish") {
            self.store.set_publish(name, is_truthy(&publish))?;
        }
        self.store.modify(name, params)
    }

    /// Delete an integration and its handler storage directory.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.store.delete(name)?;

        if let Ok(storage_dir) = self.storage_dir(name) {
            if storage_dir.is_dir() {
                if let Err(e) = std::fs::remove_dir_all(&storage_dir) {
                    warn!("Failed to remove storage for '{}': {}", name, e);
                }
            }
        }
        Ok(())
    }

    /// Build a transient handler for a connection test.
    ///
    /// Nothing is persisted; the handler's storage is a temp directory
    /// removed when the handler is dropped.
    pub fn create_tmp_handler(
        &self,
        _name: &str,
        engine: &str,
        params: Value,
    ) -> Result<Box<dyn Handler>> {
        let factory = self.registry.get_factory(engine)?;
        let storage = FileStorage::temporary()?;
        factory.create(params, storage)
    }

    /// Build a handler for a registered integration, backed by its
    /// persistent storage directory.
    pub fn get_data_handler(&self, name: &str) -> Result<Box<dyn Handler>> {
        let entry = self
            .store
            .get(name, true)
            .ok_or_else(|| hub_core::Error::NotFound(name.to_string()))?;

        let factory = self.registry.get_factory(&entry.engine)?;
        let storage = FileStorage::persistent(self.storage_dir(name)?)?;
        factory.create(entry.params, storage)
    }

    fn storage_dir(&self, name: &str) -> Result<PathBuf> {
        resolve_within(&self.data_dir.join("storage"), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hub_core::{Error, HandlerFactory, StatusResponse};
    use serde_json::json;

    struct StubHandler {
        storage: FileStorage,
        succeed: bool,
    }

    #[async_trait]
    impl Handler for StubHandler {
        fn engine(&self) -> &str {
            "stub"
        }

        async fn check_connection(&self) -> StatusResponse {
            if self.succeed {
                StatusResponse::ok()
            } else {
                StatusResponse::failed("stub refused")
            }
        }

        fn file_storage(&self) -> Option<&FileStorage> {
            Some(&self.storage)
        }
    }

    struct StubFactory;

    impl HandlerFactory for StubFactory {
        fn engine(&self) -> &str {
            "stub"
        }

        fn create(&self, params: Value, storage: FileStorage) -> Result<Box<dyn Handler>> {
            let succeed = params
                .get("succeed")
                .map(crate::is_truthy)
                .unwrap_or(true);
            Ok(Box::new(StubHandler { storage, succeed }))
        }
    }

    fn controller(dir: &std::path::Path) -> IntegrationController {
        let mut registry = Registry::new();
        registry.register(Arc::new(StubFactory));
        IntegrationController::new(IntegrationStore::new(), Arc::new(registry), dir)
    }

    #[test]
    fn test_add_rejects_unknown_engine() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctrl = controller(dir.path());

        let result = ctrl.add("x", "no-such-engine", json!({}));
        assert!(matches!(result, Err(Error::UnknownEngine(_))));
        assert!(!ctrl.exists("x"));
    }

    #[test]
    fn test_add_then_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctrl = controller(dir.path());

        ctrl.add("x", "stub", json!({"a": 1})).unwrap();
        assert!(matches!(
            ctrl.add("x", "stub", json!({})),
            Err(Error::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_modify_translates_publish() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctrl = controller(dir.path());
        ctrl.add("x", "stub", json!({})).unwrap();

        let patch = match json!({"publish": "true", "a": 2}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        ctrl.modify("x", patch).unwrap();

        let entry = ctrl.get("x", true).unwrap();
        assert!(entry.publish);
        assert_eq!(entry.params["a"], json!(2));
        assert!(entry.params.get("publish").is_none());
    }

    #[tokio::test]
    async fn test_tmp_handler_check() {
        let dir = tempfile::tempdir().unwrap();
        let ctrl = controller(dir.path());

        let handler = ctrl
            .create_tmp_handler("x", "stub", json!({"succeed": false}))
            .unwrap();
        let status = handler.check_connection().await;
        assert!(!status.success);
        assert_eq!(status.error_message.as_deref(), Some("stub refused"));
    }

    #[test]
    fn test_data_handler_storage_import() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctrl = controller(dir.path());
        ctrl.add("x", "stub", json!({})).unwrap();

        let handler = ctrl.get_data_handler("x").unwrap();
        let storage = handler.file_storage().unwrap();

        let source = FileStorage::temporary().unwrap();
        source.put("state.json", b"{}").unwrap();
        let blob = source.export_files().unwrap().unwrap();

        storage.import_files(&blob).unwrap();
        assert!(storage.contains("state.json"));
        assert!(dir.path().join("storage/x/state.json").is_file());
    }

    #[test]
    fn test_delete_removes_storage_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctrl = controller(dir.path());
        ctrl.add("x", "stub", json!({})).unwrap();

        // materialize the storage dir
        let handler = ctrl.get_data_handler("x").unwrap();
        handler.file_storage().unwrap().put("f", b"1").unwrap();
        drop(handler);

        ctrl.delete("x").unwrap();
        assert!(!ctrl.exists("x"));
        assert!(!dir.path().join("storage/x").exists());
    }
}
