use crate::{Error, HandlerFactory, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of handler factories, keyed by engine name
pub struct Registry {
    factories: HashMap<String, Arc<dyn HandlerFactory>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a handler factory
    pub fn register(&mut self, factory: Arc<dyn HandlerFactory>) {
        let engine = factory.engine().to_string();
        self.factories.insert(engine, factory);
    }

    /// Get a handler factory by engine name
    pub fn get_factory(&self, engine: &str) -> Result<Arc<dyn HandlerFactory>> {
        self.factories
            .get(engine)
            .cloned()
            .ok_or_else(|| Error::UnknownEngine(engine.to_string()))
    }

    pub fn contains(&self, engine: &str) -> bool {
        self.factories.contains_key(engine)
    }

    /// List all registered engine names
    pub fn list_engines(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
