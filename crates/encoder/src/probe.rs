//! Duration probe using ffprobe.
//!
//! The duration only drives the progress bar, so callers downgrade every
//! failure here to "unknown".

use crate::process::run_captured;
use std::path::Path;
use thiserror::Error;
use tokio::process::Command;

/// Error type for probe operations.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// ffprobe could not be started.
    #[error("Failed to run ffprobe: {0}")]
    Io(#[from] std::io::Error),

    /// ffprobe exited unsuccessfully.
    #[error("ffprobe exited with code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    /// The output was not a usable duration.
    #[error("Unusable duration in ffprobe output: {0:?}")]
    Parse(String),
}

/// Builds `ffprobe -v error -show_entries format=duration -of csv=p=0 <path>`.
pub fn build_probe_command(ffprobe: &str, path: &Path) -> Command {
    let mut cmd = Command::new(ffprobe);
    cmd.args([
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "csv=p=0",
    ])
    .arg(path);
    cmd
}

/// Parses the single CSV value printed by the probe.
///
/// Only a positive, finite number of seconds is accepted.
pub fn parse_duration(stdout: &str) -> Result<f64, ProbeError> {
    let trimmed = stdout.trim();
    match trimmed.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs > 0.0 => Ok(secs),
        _ => Err(ProbeError::Parse(trimmed.to_string())),
    }
}

/// Reads the container duration of `path` in seconds.
pub async fn probe_duration(ffprobe: &str, path: &Path) -> Result<f64, ProbeError> {
    let result = run_captured(&mut build_probe_command(ffprobe, path)).await?;

    if !result.success() {
        return Err(ProbeError::Failed {
            code: result.exit_code,
            stderr: result.stderr.trim().to_string(),
        });
    }

    parse_duration(&result.stdout)
}
