mod error;
mod factory;
mod handler;
mod registry;
mod storage;

pub use error::{Error, Result};
pub use factory::HandlerFactory;
pub use handler::{Handler, StatusResponse};
pub use registry::Registry;
pub use storage::{resolve_within, FileStorage};
