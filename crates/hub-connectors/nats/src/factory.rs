use crate::{NatsHandler, NatsParams};
use hub_core::{FileStorage, Handler, HandlerFactory, Result};
use serde_json::Value;

pub struct NatsHandlerFactory;

impl HandlerFactory for NatsHandlerFactory {
    fn engine(&self) -> &str {
        "nats"
    }

    fn create(&self, params: Value, _storage: FileStorage) -> Result<Box<dyn Handler>> {
        let params: NatsParams = serde_json::from_value(params)?;
        Ok(Box::new(NatsHandler::new(params)))
    }
}
