//! Database setup and initialization

use anyhow::{Context, Result};
use clipshelf_core::Config;
use clipshelf_db::{InMemoryVideoRepository, PgVideoRepository, VideoRepository};
use sqlx::postgres::PgPoolOptions;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Connect the video repository named by `DATABASE_URL`, running migrations
/// for Postgres.
pub async fn setup_database(config: &Config) -> Result<Arc<dyn VideoRepository>> {
    if config.uses_in_memory_database() {
        tracing::warn!("Using in-memory video repository; records are lost on restart");
        return Ok(Arc::new(InMemoryVideoRepository::new()));
    }

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.base.db_max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.base.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.base.db_max_connections,
        "Database connected successfully"
    );

    // Workspace migrations/ relative to this crate
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(Arc::new(PgVideoRepository::new(pool)))
}
