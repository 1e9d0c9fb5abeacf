//! Geometry probing and aspect-ratio classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::command::CommandRunner;
use crate::error::{PipelineError, PipelineResult};

const LANDSCAPE_RATIO: f64 = 16.0 / 9.0;
const PORTRAIT_RATIO: f64 = 9.0 / 16.0;
/// Absolute tolerance on width/height when matching a reference ratio.
const RATIO_TOLERANCE: f64 = 0.01;

/// Pixel dimensions of the first video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectClass {
    Landscape,
    Portrait,
    Other,
}

impl AspectClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectClass::Landscape => "landscape",
            AspectClass::Portrait => "portrait",
            AspectClass::Other => "other",
        }
    }
}

impl fmt::Display for AspectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Geometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Classify by aspect ratio. A zero dimension cannot be classified.
    pub fn classify(&self) -> PipelineResult<AspectClass> {
        if self.width == 0 || self.height == 0 {
            return Err(PipelineError::processing(format!(
                "Video reports a zero dimension ({}x{})",
                self.width, self.height
            )));
        }

        let ratio = f64::from(self.width) / f64::from(self.height);
        let class = if (ratio - LANDSCAPE_RATIO).abs() < RATIO_TOLERANCE {
            AspectClass::Landscape
        } else if (ratio - PORTRAIT_RATIO).abs() < RATIO_TOLERANCE {
            AspectClass::Portrait
        } else {
            AspectClass::Other
        };
        Ok(class)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u64>,
    height: Option<u64>,
}

/// Reads video dimensions with ffprobe
pub struct GeometryProber {
    runner: Arc<dyn CommandRunner>,
    ffprobe_path: String,
    timeout: Duration,
}

impl GeometryProber {
    pub fn new(runner: Arc<dyn CommandRunner>, ffprobe_path: String, timeout: Duration) -> Self {
        Self {
            runner,
            ffprobe_path,
            timeout,
        }
    }

    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    pub async fn probe(&self, path: &Path) -> PipelineResult<Geometry> {
        let args: Vec<String> = vec![
            "-v".to_string(),
            "error".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_streams".to_string(),
            path.to_string_lossy().to_string(),
        ];

        let output = self
            .runner
            .run(&self.ffprobe_path, &args, self.timeout)
            .await
            .map_err(PipelineError::from_tool)?;

        if !output.success {
            return Err(PipelineError::Processing {
                message: format!("ffprobe exited with {}", output.status_description()),
                diagnostics: Some(output.stderr_lossy()),
            });
        }

        let geometry = parse_probe_output(&output.stdout)?;
        tracing::debug!(width = geometry.width, height = geometry.height, "Video probed");
        Ok(geometry)
    }
}

fn parse_probe_output(stdout: &[u8]) -> PipelineResult<Geometry> {
    let parsed: ProbeOutput = serde_json::from_slice(stdout).map_err(|e| {
        PipelineError::processing(format!("Failed to parse ffprobe output: {}", e))
    })?;

    let untyped = parsed.streams.iter().all(|s| s.codec_type.is_none());
    let stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .or_else(|| {
            untyped
                .then(|| {
                    parsed
                        .streams
                        .iter()
                        .find(|s| s.width.is_some() && s.height.is_some())
                })
                .flatten()
        })
        .ok_or_else(|| PipelineError::processing("No video stream found"))?;

    let dimension = |value: Option<u64>, name: &str| -> PipelineResult<u32> {
        value
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .ok_or_else(|| PipelineError::processing(format!("Video stream has no valid {}", name)))
    };

    Ok(Geometry {
        width: dimension(stream.width, "width")?,
        height: dimension(stream.height, "height")?,
    })
}
