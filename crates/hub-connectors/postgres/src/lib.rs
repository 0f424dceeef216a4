mod factory;
mod postgres_handler;

pub use factory::PostgresHandlerFactory;
pub use postgres_handler::{PostgresHandler, PostgresParams};
