//! Container normalization: remux to MP4 with the index moved to the front
//! so playback can start before the whole file has downloaded.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::command::CommandRunner;
use crate::error::{PipelineError, PipelineResult};
use crate::scratch::ScratchFile;

const OUTPUT_SUFFIX: &str = ".processing";

pub struct ContainerNormalizer {
    runner: Arc<dyn CommandRunner>,
    ffmpeg_path: String,
    timeout: Duration,
}

impl ContainerNormalizer {
    pub fn new(runner: Arc<dyn CommandRunner>, ffmpeg_path: String, timeout: Duration) -> Self {
        Self {
            runner,
            ffmpeg_path,
            timeout,
        }
    }

    /// Remux `input` into a sibling file without re-encoding.
    ///
    /// The input is left untouched. The returned guard owns the output.
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    pub async fn normalize(&self, input: &Path) -> PipelineResult<ScratchFile> {
        let output = ScratchFile::adopt(output_path(input));
        let input_arg = input.to_string_lossy().to_string();
        let output_arg = output.path().to_string_lossy().to_string();

        let args: Vec<String> = vec![
            "-y".to_string(),
            "-i".to_string(),
            input_arg,
            "-c".to_string(),
            "copy".to_string(),
            "-movflags".to_string(),
            "faststart".to_string(),
            "-f".to_string(),
            "mp4".to_string(),
            output_arg,
        ];

        let result = self
            .runner
            .run(&self.ffmpeg_path, &args, self.timeout)
            .await
            .map_err(PipelineError::from_tool)?;

        if !result.success {
            return Err(PipelineError::Processing {
                message: format!("ffmpeg exited with {}", result.status_description()),
                diagnostics: Some(result.stderr_lossy()),
            });
        }

        let written = tokio::fs::metadata(output.path())
            .await
            .map(|meta| meta.len())
            .unwrap_or(0);
        if written == 0 {
            return Err(PipelineError::Processing {
                message: "ffmpeg produced no output".to_string(),
                diagnostics: Some(result.stderr_lossy()),
            });
        }

        tracing::debug!(size_bytes = written, "Container normalized");
        Ok(output)
    }
}

fn output_path(input: &Path) -> PathBuf {
    let mut path = OsString::from(input.as_os_str());
    path.push(OUTPUT_SUFFIX);
    PathBuf::from(path)
}
