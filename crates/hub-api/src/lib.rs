pub mod error;
pub mod handlers;
pub mod params;
pub mod server;

pub use error::ApiError;
pub use server::{router, ApiServer};
