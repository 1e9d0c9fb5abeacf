//! Upload pipeline: buffer, normalize, probe, derive a key, publish.

use clipshelf_core::models::StoredReference;
use clipshelf_core::Config;
use clipshelf_storage::Storage;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncRead;

use crate::command::CommandRunner;
use crate::error::PipelineResult;
use crate::keys::StorageKey;
use crate::normalize::ContainerNormalizer;
use crate::probe::{AspectClass, Geometry, GeometryProber};
use crate::publish::Publisher;
use crate::scratch::ScratchFile;
use crate::session::UploadSession;

/// Outcome of a successful pipeline run
#[derive(Debug, Clone)]
pub struct PublishedVideo {
    pub reference: StoredReference,
    pub geometry: Geometry,
    pub aspect: AspectClass,
    pub size_bytes: u64,
}

/// Holds only shared, immutable collaborators; one instance serves every request.
pub struct UploadPipeline {
    scratch_dir: PathBuf,
    normalizer: ContainerNormalizer,
    prober: GeometryProber,
    publisher: Publisher,
}

impl UploadPipeline {
    pub fn new(config: &Config, runner: Arc<dyn CommandRunner>, storage: Arc<dyn Storage>) -> Self {
        let timeout = config.process_timeout();
        Self {
            scratch_dir: config.processing.scratch_dir.clone(),
            normalizer: ContainerNormalizer::new(
                runner.clone(),
                config.processing.ffmpeg_path.clone(),
                timeout,
            ),
            prober: GeometryProber::new(runner, config.processing.ffprobe_path.clone(), timeout),
            publisher: Publisher::new(storage),
        }
    }

    /// Run the whole pipeline for one upload body.
    ///
    /// Scratch files are removed however this returns, including when the
    /// future is dropped part-way.
    #[tracing::instrument(skip(self, session, body), fields(content_type = %session.content_type()))]
    pub async fn run<R>(&self, session: &UploadSession, body: &mut R) -> PipelineResult<PublishedVideo>
    where
        R: AsyncRead + Unpin + Send + ?Sized,
    {
        let start = std::time::Instant::now();

        let suffix = format!(".{}", session.extension());
        let mut buffered = ScratchFile::acquire(&self.scratch_dir, &suffix).await?;
        let size_bytes = buffered.fill(body).await?;
        tracing::debug!(size_bytes, "Upload buffered");

        let normalized = self.normalizer.normalize(buffered.path()).await?;
        let geometry = self.prober.probe(normalized.path()).await?;
        let aspect = geometry.classify()?;
        let key = StorageKey::derive(aspect, session.extension())?;

        let reference = self
            .publisher
            .publish(normalized.path(), &key, session.content_type())
            .await?;

        // The object is durable now; a stuck scratch file must not fail the upload.
        for scratch in [normalized, buffered] {
            if let Err(e) = scratch.release().await {
                tracing::warn!(error = %e, "Scratch cleanup failed after publish");
            }
        }

        tracing::info!(
            key = %reference.key(),
            aspect = %aspect,
            width = geometry.width,
            height = geometry.height,
            size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload pipeline completed"
        );

        Ok(PublishedVideo {
            reference,
            geometry,
            aspect,
            size_bytes,
        })
    }
}
