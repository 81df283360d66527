use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use server::config::ConfigManager;
use server::database::Database;
use workers::{start_status_server, JobRegistry, StatusState, WorkerContext, WorkerScheduler};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with reduced verbosity
    let env_filter = EnvFilter::from_default_env()
        .add_directive("workers=info".parse()?)
        .add_directive("server=info".parse()?)
        .add_directive("tower_http=warn".parse()?)
        .add_directive("tokio_cron_scheduler=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting Luber workers");

    // Load configuration
    let config_manager = ConfigManager::new("config".to_string()).await?;
    let config = config_manager.get_current_config();

    if config.office_api_key.is_empty() {
        warn!("No office API key configured, chat updates will not reach the office dashboard");
    }

    // Initialize database
    let database = Arc::new(Database::new(&config.database_path).await?);
    info!("Database initialized");

    let context = WorkerContext::from_config(config, database)?;
    let registry = JobRegistry::new();

    let mut scheduler = WorkerScheduler::new(context.clone(), registry.clone()).await?;
    scheduler.start().await?;

    let status = StatusState { context, registry };
    tokio::select! {
        result = start_status_server(status) => {
            if let Err(e) = result {
                error!("Status server stopped: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    scheduler.shutdown().await?;
    info!("Workers stopped");
    Ok(())
}
