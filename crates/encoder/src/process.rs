//! Captured result of an external process.

use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

/// Exit status and output of a finished subprocess
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessResult {
    /// Exit code, `None` if the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessResult {
    pub fn from_status(status: ExitStatus, stdout: String, stderr: String) -> Self {
        Self {
            exit_code: status.code(),
            stdout,
            stderr,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs a command to completion with stdin closed and both output streams captured.
pub async fn run_captured(cmd: &mut Command) -> std::io::Result<ProcessResult> {
    let output = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await?;

    Ok(ProcessResult::from_status(
        output.status,
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    ))
}
