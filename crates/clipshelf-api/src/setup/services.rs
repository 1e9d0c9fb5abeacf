//! Builds the shared application state from its collaborators.

use crate::auth::JwtValidator;
use crate::state::AppState;
use anyhow::{Context, Result};
use clipshelf_core::{Config, StorageBackend};
use clipshelf_db::VideoRepository;
use clipshelf_processing::{CommandRunner, ReferenceResolver, TokioCommandRunner, UploadPipeline};
use clipshelf_storage::{create_local_storage, create_storage, LocalStorage, Storage};
use std::sync::Arc;

/// Storage selected by configuration. The concrete local store is kept as
/// well so the API can serve its signed URLs.
pub async fn setup_storage(
    config: &Config,
) -> Result<(Arc<dyn Storage>, Option<Arc<LocalStorage>>)> {
    match config.storage.backend {
        StorageBackend::Local => {
            let local = Arc::new(
                create_local_storage(config)
                    .await
                    .context("Failed to initialize local storage")?,
            );
            let storage: Arc<dyn Storage> = local.clone();
            Ok((storage, Some(local)))
        }
        StorageBackend::S3 => {
            let storage = create_storage(config)
                .await
                .context("Failed to initialize S3 storage")?;
            Ok((storage, None))
        }
    }
}

/// Wire the pipeline, resolver and auth around already-built collaborators.
pub fn build_state(
    config: Config,
    videos: Arc<dyn VideoRepository>,
    storage: Arc<dyn Storage>,
    local_media: Option<Arc<LocalStorage>>,
    runner: Arc<dyn CommandRunner>,
) -> Arc<AppState> {
    let pipeline = UploadPipeline::new(&config, runner, storage.clone());
    let resolver = ReferenceResolver::new(storage.clone(), config.presigned_url_ttl());
    let jwt = JwtValidator::new(&config.base.jwt_secret);
    let hide_error_details = config.is_production();

    Arc::new(AppState {
        config,
        jwt,
        videos,
        storage,
        local_media,
        pipeline,
        resolver,
        hide_error_details,
    })
}

/// Initialize all services for a production process
pub async fn initialize_services(
    config: &Config,
    videos: Arc<dyn VideoRepository>,
) -> Result<Arc<AppState>> {
    let (storage, local_media) = setup_storage(config).await?;
    tracing::info!(
        backend = ?storage.backend_type(),
        bucket = %storage.bucket(),
        "Storage initialized"
    );

    Ok(build_state(
        config.clone(),
        videos,
        storage,
        local_media,
        Arc::new(TokioCommandRunner),
    ))
}
