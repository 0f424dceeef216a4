mod factory;
mod nats_handler;

pub use factory::NatsHandlerFactory;
pub use nats_handler::{NatsHandler, NatsParams};
