use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use server::config::ConfigManager;
use server::database::Database;
use server::web::{start_web_server, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with reduced verbosity
    let env_filter = EnvFilter::from_default_env()
        .add_directive("server=info".parse()?)
        .add_directive("tower_http=warn".parse()?)
        .add_directive("tower_sessions=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting Luber API server");

    // Load configuration
    let config_manager = ConfigManager::new("config".to_string()).await?;
    let config = config_manager.get_current_config();

    if config.office_api_key.is_empty() {
        warn!("No office API key configured, office routes and the hub relay are closed");
    }
    if !config.paypal.is_configured() {
        warn!("PayPal credentials missing, customer bookings will fail at checkout");
    }

    // Initialize database
    let database = Arc::new(Database::new(&config.database_path).await?);
    info!("Database initialized");

    let state = AppState::build(config, database)?;
    info!("Services initialized");

    start_web_server(state).await
}
