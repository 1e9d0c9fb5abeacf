//! External process execution.
//!
//! Media tools are reached through [`CommandRunner`] so the pipeline can be
//! exercised without ffmpeg installed.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Captured result of a finished process
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub status_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Describe the exit status for error messages.
    pub fn status_description(&self) -> String {
        match self.status_code {
            Some(code) => format!("status {}", code),
            None => "a signal".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

/// Runs an external program to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError>;
}

/// [`CommandRunner`] backed by `tokio::process`.
///
/// Children are killed when the run future is dropped, which covers both
/// the timeout and a cancelled request.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    #[tracing::instrument(skip(self, args), fields(process.executable.name = %program))]
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        let start = std::time::Instant::now();

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })?,
            Err(_) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "Process exceeded its time limit and was killed"
                );
                return Err(CommandError::TimedOut {
                    program: program.to_string(),
                    timeout,
                });
            }
        };

        tracing::debug!(
            exit_code = ?output.status.code(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Process finished"
        );

        Ok(CommandOutput {
            success: output.status.success(),
            status_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_captures_stdout_and_stderr() {
        let output = TokioCommandRunner
            .run("sh", &sh("echo out; echo err >&2"), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(output.success);
        assert_eq!(output.stdout, b"out\n");
        assert_eq!(output.stderr_lossy(), "err\n");
    }

    #[tokio::test]
    async fn test_reports_failure_status() {
        let output = TokioCommandRunner
            .run("sh", &sh("exit 3"), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!output.success);
        assert_eq!(output.status_code, Some(3));
        assert_eq!(output.status_description(), "status 3");
    }

    #[tokio::test]
    async fn test_times_out() {
        let start = std::time::Instant::now();
        let result = TokioCommandRunner
            .run("sh", &sh("sleep 10"), Duration::from_millis(100))
            .await;
        assert!(matches!(result, Err(CommandError::TimedOut { .. })));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let result = TokioCommandRunner
            .run(
                "clipshelf-definitely-not-installed",
                &[],
                Duration::from_secs(1),
            )
            .await;
        assert!(matches!(result, Err(CommandError::Spawn { .. })));
    }
}
