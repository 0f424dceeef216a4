use axum::{response::IntoResponse, Json};
use hub_config::ConfigStore;
use hub_store::IntegrationController;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod config;
pub mod integrations;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<ConfigStore>>,
    pub controller: Arc<RwLock<IntegrationController>>,
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({"status": "healthy"}))
}
