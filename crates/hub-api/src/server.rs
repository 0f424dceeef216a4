use crate::handlers::{config, health_check, integrations, AppState};
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Configuration
        .route("/config", get(config::get_config).put(config::put_config))
        // Integration management
        .route(
            "/config/integrations",
            get(integrations::list_integrations),
        )
        .route(
            "/config/all_integrations",
            get(integrations::all_integrations),
        )
        .route(
            "/config/integrations/{name}",
            get(integrations::get_integration)
                .put(integrations::upsert_integration)
                .post(integrations::modify_integration)
                .delete(integrations::delete_integration),
        )
        .with_state(state)
}

pub struct ApiServer {
    host: String,
    port: u16,
    cors_enabled: bool,
    state: AppState,
}

impl ApiServer {
    pub fn new(host: String, port: u16, cors_enabled: bool, state: AppState) -> Self {
        Self {
            host,
            port,
            cors_enabled,
            state,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let mut app = router(self.state);

        if self.cors_enabled {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);

            app = app.layer(cors);
        }

        let addr = format!("{}:{}", self.host, self.port);
        info!("Starting API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
