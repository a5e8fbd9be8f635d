mod app;
mod form;

use std::{
    fs::{self, OpenOptions},
    sync::Arc,
};

use anyhow::{Context, Result};
use gamecat_core::{
    config::{self, AppConfig},
    CatalogueController, HttpGamesApi,
};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config)?;
    tracing::info!(api = %config.base_url(), "Starting gamecat");

    let api = HttpGamesApi::new(&config).context("failed to build HTTP client")?;
    let controller = CatalogueController::new(Arc::new(api));

    let mut app = app::CatalogueApp::new(controller);
    app.run().await
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let log_dir = config.log_dir()?;
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("gamecat.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // The terminal is in raw mode for the whole session, so nothing goes to stdout.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
