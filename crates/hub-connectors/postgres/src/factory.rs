use crate::{PostgresHandler, PostgresParams};
use hub_core::{FileStorage, Handler, HandlerFactory, Result};
use serde_json::Value;

pub struct PostgresHandlerFactory;

impl HandlerFactory for PostgresHandlerFactory {
    fn engine(&self) -> &str {
        "postgres"
    }

    fn create(&self, params: Value, storage: FileStorage) -> Result<Box<dyn Handler>> {
        let params: PostgresParams = serde_json::from_value(params)?;
        Ok(Box::new(PostgresHandler::new(params, storage)?))
    }
}
