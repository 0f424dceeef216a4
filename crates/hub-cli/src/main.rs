use clap::{Parser, Subcommand};
use hub_api::{handlers::AppState, ApiServer};
use hub_config::{AppConfig, ConfigStore};
use hub_core::Registry;
use hub_nats_handler::NatsHandlerFactory;
use hub_postgres_handler::PostgresHandlerFactory;
use hub_store::{IntegrationController, IntegrationStore};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "hub-cli")]
#[command(about = "Integration Hub admin API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the admin API server
    Serve {
        /// Path to configuration directory
        #[arg(short, long, default_value = "config")]
        config_dir: String,
    },

    /// Validate configuration files
    Validate {
        /// Path to configuration directory
        #[arg(short, long, default_value = "config")]
        config_dir: String,
    },
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn build_registry() -> Arc<Registry> {
    let mut registry = Registry::new();

    registry.register(Arc::new(PostgresHandlerFactory));
    info!("Registered engine: postgres");

    registry.register(Arc::new(NatsHandlerFactory));
    info!("Registered engine: nats");

    Arc::new(registry)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config_dir } => {
            let app_config = AppConfig::load(&config_dir)?;
            init_tracing(&app_config.logging.level)?;

            info!("Starting Integration Hub with config directory: {}", config_dir);

            let registry = build_registry();
            info!("Available engines: {:?}", registry.list_engines());

            let data_dir = Path::new(&app_config.data_dir);

            let config_store = ConfigStore::load(data_dir.join("config.yaml"))?;
            let integration_store = IntegrationStore::load(data_dir)?;
            info!("Loaded {} integration(s)", integration_store.names().len());

            let controller = IntegrationController::new(integration_store, registry, data_dir);

            let state = AppState {
                config: Arc::new(RwLock::new(config_store)),
                controller: Arc::new(RwLock::new(controller)),
            };

            let server = ApiServer::new(
                app_config.api.host.clone(),
                app_config.api.port,
                app_config.api.cors_enabled,
                state,
            );
            server.run().await
        }

        Commands::Validate { config_dir } => {
            let app_config = AppConfig::load(&config_dir)?;

            let data_dir = Path::new(&app_config.data_dir);
            let config_store = ConfigStore::load(data_dir.join("config.yaml"))?;
            let integration_store = IntegrationStore::load(data_dir)?;

            println!("Configuration is valid");
            println!(
                "  api: {}:{} (cors: {})",
                app_config.api.host, app_config.api.port, app_config.api.cors_enabled
            );
            println!(
                "  secret_key: {}",
                if config_store.secret_key().is_some() {
                    "set"
                } else {
                    "NOT SET (development fallback will be used)"
                }
            );
            println!("  integrations: {}", integration_store.names().len());
            for name in integration_store.names() {
                println!("    - {}", name);
            }
            Ok(())
        }
    }
}
