//! Scripted stand-ins for ffmpeg and ffprobe.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::command::{CommandError, CommandOutput, CommandRunner};
use crate::probe::Geometry;

/// Pretends to be ffmpeg (copies input to output) and ffprobe (reports a
/// fixed geometry). Either tool can be told to fail or to run slowly.
#[derive(Debug)]
pub struct ScriptedMediaTools {
    geometry: Geometry,
    fail_normalize: Option<String>,
    fail_probe: Option<String>,
    delay: Duration,
    invocations: AtomicUsize,
}

impl ScriptedMediaTools {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            geometry: Geometry::new(width, height),
            fail_normalize: None,
            fail_probe: None,
            delay: Duration::ZERO,
            invocations: AtomicUsize::new(0),
        }
    }

    /// Make ffmpeg write a partial output and exit non-zero.
    pub fn failing_normalize(mut self, stderr: &str) -> Self {
        self.fail_normalize = Some(stderr.to_string());
        self
    }

    pub fn failing_probe(mut self, stderr: &str) -> Self {
        self.fail_probe = Some(stderr.to_string());
        self
    }

    /// Sleep this long before every tool run.
    pub fn slowed_by(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of tool runs so far
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    async fn ffmpeg(&self, args: &[String]) -> CommandOutput {
        let input = args
            .iter()
            .position(|arg| arg == "-i")
            .and_then(|i| args.get(i + 1));
        let output = args.last();

        let (Some(input), Some(output)) = (input, output) else {
            return failure("missing input or output");
        };

        if let Some(stderr) = &self.fail_normalize {
            let _ = tokio::fs::write(output, b"partial").await;
            return failure(stderr);
        }

        match tokio::fs::copy(input, output).await {
            Ok(_) => success(Vec::new()),
            Err(e) => failure(&e.to_string()),
        }
    }

    fn ffprobe(&self) -> CommandOutput {
        if let Some(stderr) = &self.fail_probe {
            return failure(stderr);
        }
        let body = serde_json::json!({
            "streams": [
                { "index": 0, "codec_type": "audio", "sample_rate": "48000" },
                {
                    "index": 1,
                    "codec_type": "video",
                    "width": self.geometry.width,
                    "height": self.geometry.height
                }
            ]
        });
        success(body.to_string().into_bytes())
    }
}

fn success(stdout: Vec<u8>) -> CommandOutput {
    CommandOutput {
        success: true,
        status_code: Some(0),
        stdout,
        stderr: Vec::new(),
    }
}

fn failure(stderr: &str) -> CommandOutput {
    CommandOutput {
        success: false,
        status_code: Some(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

#[async_trait]
impl CommandRunner for ScriptedMediaTools {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        _timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if program.ends_with("ffprobe") {
            Ok(self.ffprobe())
        } else if program.ends_with("ffmpeg") {
            Ok(self.ffmpeg(args).await)
        } else {
            Err(CommandError::Spawn {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "unknown tool"),
            })
        }
    }
}
