pub mod api;
pub mod config;
pub mod db;
pub mod explanation;
pub mod models;
pub mod triage;

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, ConfigError};
use crate::db::{CaseStore, DatabaseError, SqliteCaseStore};
use crate::triage::TriageEngine;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Startup worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Start the service and run until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("DermSight starting v{}", config::APP_VERSION);

    let config = AppConfig::from_env()?;
    tracing::info!(
        db = %config.database_path.display(),
        policy = config.risk_policy.as_str(),
        max_image_bytes = config.max_image_bytes,
        "Configuration loaded"
    );

    // The explanation client is blocking; build it (and later drop it) off
    // the async runtime.
    let engine = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || -> Result<TriageEngine, StartupError> {
            let store: Arc<dyn CaseStore> = Arc::new(SqliteCaseStore::open(&config.database_path)?);
            Ok(TriageEngine::from_config(&config, store))
        })
        .await??
    };
    let engine = Arc::new(engine);

    let ctx = api::ApiContext::new(engine.clone(), config.max_image_bytes);
    let served = api::serve(config.bind_addr, ctx).await;

    tokio::task::spawn_blocking(move || drop(engine)).await?;
    served?;

    tracing::info!("DermSight stopped");
    Ok(())
}
