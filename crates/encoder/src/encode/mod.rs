//! Encoding modules for the batch encoder

pub mod vaapi;

pub use vaapi::{build_ffmpeg_command, stream_process, VaapiEncoder, VaapiSettings};

use crate::process::ProcessResult;
use crate::queue::WorkItem;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for encoding operations
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The encoder process could not be started
    #[error("Failed to start encoder for {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Encoder exited with non-zero status
    #[error("Failed to encode {name}: encoder exited with code {code}: {stderr}")]
    Failed {
        name: String,
        code: i32,
        stderr: String,
    },

    /// Encoder was terminated by a signal
    #[error("Failed to encode {name}: encoder was terminated by signal: {stderr}")]
    Terminated { name: String, stderr: String },

    /// A leftover file at the output path could not be removed
    #[error("Failed to remove stale output {path}: {source}")]
    StaleOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error while streaming output or reading result sizes
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One in-flight transcode
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub input: WorkItem,
    /// Probed duration; `None` disables the progress bar for this job
    pub expected_duration_secs: Option<f64>,
    pub output_path: PathBuf,
}

/// Sizes of both files after an encode that exited cleanly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeResult {
    pub input_size_bytes: u64,
    pub output_size_bytes: u64,
    pub output_path: PathBuf,
}

/// Turns a finished encoder process into success or an `EncodeError`.
///
/// This is the only place the encoder's exit status is inspected.
pub fn check_exit(name: &str, result: ProcessResult) -> Result<(), EncodeError> {
    match result.exit_code {
        Some(0) => Ok(()),
        Some(code) => Err(EncodeError::Failed {
            name: name.to_string(),
            code,
            stderr: result.stderr.trim().to_string(),
        }),
        None => Err(EncodeError::Terminated {
            name: name.to_string(),
            stderr: result.stderr.trim().to_string(),
        }),
    }
}

/// Transcodes one work item into `output_path`.
///
/// Implementations block until the encoder process has exited.
#[allow(async_fn_in_trait)]
pub trait Encoder {
    async fn encode(&self, item: &WorkItem, output_path: &Path) -> Result<EncodeResult, EncodeError>;
}
