//! Subprocess execution for metric probes.
//!
//! `df`, `sysctl` and `system_profiler` are run through here so each probe
//! gets the same timeout and failure mapping.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{Result, StatusError};

/// Output from a finished command.
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    /// Check if command succeeded (exit code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run a command with a timeout.
///
/// # Errors
///
/// - `CommandNotFound` when the binary is missing
/// - `Timeout` when it runs past `timeout_duration` (the child is killed)
/// - `SourceUnavailable` for any other spawn or I/O failure
pub async fn run_command(
    program: &str,
    args: &[&str],
    timeout_duration: Duration,
) -> Result<CommandOutput> {
    tracing::debug!(program, ?args, "running command");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StatusError::CommandNotFound(program.to_string())
            } else {
                StatusError::unavailable(program, e)
            }
        })?;

    let result = timeout(timeout_duration, async {
        // Both pipes are drained together; a child filling one while we
        // block on the other would never exit.
        let stdout_handle = async {
            let mut stdout = String::new();
            if let Some(mut out) = child.stdout.take() {
                out.read_to_string(&mut stdout).await?;
            }
            Ok::<_, std::io::Error>(stdout)
        };

        let stderr_handle = async {
            let mut stderr = String::new();
            if let Some(mut err) = child.stderr.take() {
                err.read_to_string(&mut stderr).await?;
            }
            Ok::<_, std::io::Error>(stderr)
        };

        let (stdout_result, stderr_result) = tokio::join!(stdout_handle, stderr_handle);
        let stdout = stdout_result?;
        let stderr = stderr_result?;

        let status = child.wait().await?;

        Ok::<_, std::io::Error>(CommandOutput {
            stdout,
            stderr,
            exit_code: status.code().unwrap_or(-1),
        })
    })
    .await;

    match result {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(StatusError::unavailable(program, e)),
        Err(_) => {
            let _ = child.kill().await;
            let _ = child.wait().await;
            Err(StatusError::Timeout {
                program: program.to_string(),
                seconds: timeout_duration.as_secs(),
            })
        }
    }
}

/// Run a command and return stdout, treating a non-zero exit as a failure.
pub async fn run_checked(
    program: &str,
    args: &[&str],
    timeout_duration: Duration,
) -> Result<String> {
    let output = run_command(program, args, timeout_duration).await?;
    if !output.success() {
        return Err(StatusError::unavailable(
            program,
            format!("exit code {}: {}", output.exit_code, output.stderr.trim()),
        ));
    }
    Ok(output.stdout)
}
