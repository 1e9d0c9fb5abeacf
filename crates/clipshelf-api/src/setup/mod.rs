//! Application setup and initialization
//!
//! Everything `main` needs to turn a [`Config`] into a running router.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::{Context, Result};
use clipshelf_core::Config;
use std::sync::Arc;

/// Create the directories the pipeline and thumbnail handler write into.
pub async fn prepare_directories(config: &Config) -> Result<()> {
    for dir in [
        &config.processing.scratch_dir,
        &config.processing.assets_root,
    ] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    Ok(())
}

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    prepare_directories(&config).await?;

    let videos = database::setup_database(&config).await?;
    let state = services::initialize_services(&config, videos).await?;
    let router = routes::setup_routes(&config, state.clone())?;

    tracing::info!(environment = %config.base.environment, "Application initialized");
    Ok((state, router))
}
