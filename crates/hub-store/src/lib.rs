mod controller;
mod models;
mod store;

pub use controller::IntegrationController;
pub use models::{is_truthy, IntegrationEntry};
pub use store::IntegrationStore;
