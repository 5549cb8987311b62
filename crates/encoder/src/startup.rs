//! Startup checks module for the batch encoder
//!
//! Verifies that every external tool the run will need is installed before
//! any file is touched.

use crate::process::run_captured;
use encoder_config::{BatchFlags, Config};
use log::debug;
use thiserror::Error;
use tokio::process::Command;

/// Error types for startup checks
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Missing dependency: {0}")]
    DependencyMissing(String),
}

/// Tools the run will call, in the order they are checked
///
/// The encoder and probe are always needed; the notifier and power control
/// only when the matching flag is set.
pub fn required_tools<'a>(config: &'a Config, flags: &BatchFlags) -> Vec<&'a str> {
    let mut tools = vec![config.tools.ffmpeg.as_str(), config.tools.ffprobe.as_str()];

    if flags.notify_on_finish {
        tools.push(config.tools.notify_send.as_str());
    }

    if flags.power_off {
        tools.push(config.tools.systemctl.as_str());
    }

    tools
}

/// Check if `tool` resolves via the tool-existence probe (`which <tool>`)
///
/// A probe that cannot be run counts as "not found".
pub async fn command_exists(which: &str, tool: &str) -> bool {
    match run_captured(Command::new(which).arg(tool)).await {
        Ok(result) => result.success(),
        Err(e) => {
            debug!("{} {} could not be run: {}", which, tool, e);
            false
        }
    }
}

/// Run all startup checks in order
///
/// Fails on the first missing tool.
pub async fn check_dependencies(config: &Config, flags: &BatchFlags) -> Result<(), StartupError> {
    for tool in required_tools(config, flags) {
        if !command_exists(&config.tools.which, tool).await {
            return Err(StartupError::DependencyMissing(tool.to_string()));
        }
        debug!("Found dependency: {}", tool);
    }
    Ok(())
}
