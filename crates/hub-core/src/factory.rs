use crate::{FileStorage, Handler, Result};
use serde_json::Value;

/// Factory trait for creating handlers
pub trait HandlerFactory: Send + Sync {
    /// Get the engine identifier for this handler kind
    fn engine(&self) -> &str;

    /// Create a new handler instance from params, backed by the given storage
    fn create(&self, params: Value, storage: FileStorage) -> Result<Box<dyn Handler>>;
}
