//! Scratch files on local disk.
//!
//! A [`ScratchFile`] deletes its file when dropped, so every way out of the
//! pipeline (success, a failed stage, a cancelled request) leaves the
//! scratch directory as it found it.

use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncRead, AsyncWriteExt};
use uuid::Uuid;

use crate::error::{PipelineError, PipelineResult};

/// Marker carried inside an `io::Error` when the request body hit its size limit.
#[derive(Debug, Clone, Copy)]
pub struct UploadTooLarge;

impl fmt::Display for UploadTooLarge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("request body exceeds the upload limit")
    }
}

impl std::error::Error for UploadTooLarge {}

#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    released: bool,
}

impl ScratchFile {
    /// Create a new, empty, uniquely named file in `dir`.
    pub async fn acquire(dir: &Path, suffix: &str) -> PipelineResult<Self> {
        Self::create(dir.join(format!(
            "clipshelf-upload-{}{}",
            Uuid::new_v4().simple(),
            suffix
        )))
        .await
    }

    /// Create an empty file at exactly `path`, failing if it already exists.
    pub async fn create(path: PathBuf) -> PipelineResult<Self> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                PipelineError::Storage(format!(
                    "Failed to create scratch file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        tracing::debug!(path = %path.display(), "Scratch file created");
        Ok(Self {
            path,
            released: false,
        })
    }

    /// Take ownership of a file written by someone else, typically an
    /// external tool. The file does not need to exist yet.
    pub fn adopt(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy `reader` to the file and flush it to disk. Returns the byte count.
    pub async fn fill<R>(&mut self, reader: &mut R) -> PipelineResult<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)
            .await
            .map_err(|e| PipelineError::Storage(format!("Failed to open scratch file: {}", e)))?;

        let size = tokio::io::copy(reader, &mut file).await.map_err(|e| {
            let too_large = e
                .get_ref()
                .map(|inner| inner.is::<UploadTooLarge>())
                .unwrap_or(false);
            if too_large {
                PipelineError::PayloadTooLarge(e.to_string())
            } else {
                PipelineError::Storage(format!("Failed to buffer upload: {}", e))
            }
        })?;

        let flush_err =
            |e: std::io::Error| PipelineError::Storage(format!("Failed to flush scratch file: {}", e));
        file.flush().await.map_err(flush_err)?;
        file.sync_all().await.map_err(flush_err)?;

        if size == 0 {
            return Err(PipelineError::Validation("Uploaded file is empty".to_string()));
        }

        Ok(size)
    }

    /// Keep the file: it will no longer be removed on drop.
    pub fn persist(mut self) -> PathBuf {
        self.released = true;
        std::mem::take(&mut self.path)
    }

    /// Delete the file now. Missing files are fine.
    pub async fn release(mut self) -> PipelineResult<()> {
        self.released = true;
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PipelineError::Storage(format!(
                "Failed to remove scratch file {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Scratch file removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove scratch file"
            ),
        }
    }
}
