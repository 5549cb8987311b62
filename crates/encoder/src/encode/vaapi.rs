//! VAAPI ffmpeg encoder
//!
//! Builds and runs the hardware-accelerated ffmpeg command for one file,
//! feeding its `-progress` stream to the progress reporter.

use super::{check_exit, EncodeError, EncodeJob, EncodeResult, Encoder};
use crate::probe::probe_duration;
use crate::process::ProcessResult;
use crate::progress::ProgressReporter;
use crate::queue::WorkItem;
use encoder_config::Config;
use log::{debug, info, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

/// Fixed hardware settings for every job in a batch
#[derive(Debug, Clone, PartialEq)]
pub struct VaapiSettings {
    pub ffmpeg: String,
    pub ffprobe: String,
    pub vaapi_device: PathBuf,
    pub video_filter: String,
    pub video_codec: String,
}

impl VaapiSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ffmpeg: config.tools.ffmpeg.clone(),
            ffprobe: config.tools.ffprobe.clone(),
            vaapi_device: config.encoder.vaapi_device.clone(),
            video_filter: config.encoder.video_filter.clone(),
            video_codec: config.encoder.video_codec.clone(),
        }
    }
}

/// Build the ffmpeg command for one job
///
/// Creates a Command configured with:
/// - Errors-only logging and a machine-readable progress stream on stdout
/// - The VAAPI render device
/// - Input and output paths
/// - The upload filter graph and hardware codec
pub fn build_ffmpeg_command(settings: &VaapiSettings, job: &EncodeJob) -> Command {
    let mut cmd = Command::new(&settings.ffmpeg);

    cmd.args(["-hide_banner", "-nostdin"]);
    cmd.arg("-loglevel").arg("error");
    cmd.arg("-progress").arg("pipe:1");

    cmd.arg("-vaapi_device").arg(&settings.vaapi_device);
    cmd.arg("-i").arg(&job.input.source_path);
    cmd.arg("-vf").arg(&settings.video_filter);
    cmd.arg("-c:v").arg(&settings.video_codec);
    cmd.arg(&job.output_path);

    cmd
}

/// Runs a process, passing each stdout line to `on_line` as it arrives.
///
/// stderr is drained alongside so a chatty encoder cannot stall on a full
/// pipe. The returned result carries stderr; stdout is consumed by `on_line`.
/// Only a failed spawn is reported as `Spawn`; later IO errors are `Io`.
pub async fn stream_process<F>(
    name: &str,
    mut cmd: Command,
    mut on_line: F,
) -> Result<ProcessResult, EncodeError>
where
    F: FnMut(&str),
{
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| EncodeError::Spawn {
            name: name.to_string(),
            source,
        })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("encoder stdout was not captured"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other("encoder stderr was not captured"))?;

    let progress = async {
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            on_line(&line);
        }
        Ok::<_, io::Error>(())
    };
    let errors = async {
        let mut buf = Vec::new();
        stderr.read_to_end(&mut buf).await?;
        Ok::<_, io::Error>(buf)
    };

    let (progress, errors) = tokio::join!(progress, errors);
    let status = child.wait().await?;
    progress?;
    let stderr = String::from_utf8_lossy(&errors?).into_owned();

    Ok(ProcessResult::from_status(status, String::new(), stderr))
}

/// Removes a leftover regular file at `path`.
///
/// A missing file is fine. Anything else that is not a plain file is left
/// for the encoder to trip over.
pub fn remove_stale_output(path: &Path) -> Result<(), EncodeError> {
    let stale = |source| EncodeError::StaleOutput {
        path: path.to_path_buf(),
        source,
    };

    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_file() || meta.file_type().is_symlink() => {
            std::fs::remove_file(path).map_err(stale)?;
            debug!("Removed stale output {}", path.display());
            Ok(())
        }
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(stale(e)),
    }
}

/// Encoder driving ffmpeg with VAAPI hardware acceleration
#[derive(Debug, Clone)]
pub struct VaapiEncoder {
    settings: VaapiSettings,
}

impl VaapiEncoder {
    pub fn new(settings: VaapiSettings) -> Self {
        Self { settings }
    }

    /// Probes the input, tolerating failure.
    async fn expected_duration(&self, item: &WorkItem) -> Option<f64> {
        match probe_duration(&self.settings.ffprobe, &item.source_path).await {
            Ok(secs) => Some(secs),
            Err(e) => {
                warn!("Could not get duration of {}, progress disabled: {}", item.name, e);
                None
            }
        }
    }

    /// Execute one encoding job
    ///
    /// Blocks until ffmpeg exits. Returns the sizes of both files when it
    /// exited cleanly; the caller still decides whether the encode is kept.
    pub async fn run(&self, job: EncodeJob) -> Result<EncodeResult, EncodeError> {
        let cmd = build_ffmpeg_command(&self.settings, &job);
        debug!("Executing: {:?}", cmd.as_std());

        let reporter = ProgressReporter::new(job.expected_duration_secs);
        let result = stream_process(&job.input.name, cmd, |line| reporter.update(line)).await?;
        reporter.finish();

        check_exit(&job.input.name, result)?;
        info!("Encoding complete!");

        let input_size_bytes = tokio::fs::metadata(&job.input.source_path).await?.len();
        let output_size_bytes = tokio::fs::metadata(&job.output_path).await?.len();

        Ok(EncodeResult {
            input_size_bytes,
            output_size_bytes,
            output_path: job.output_path,
        })
    }
}

impl Encoder for VaapiEncoder {
    async fn encode(&self, item: &WorkItem, output_path: &Path) -> Result<EncodeResult, EncodeError> {
        info!("Encoding {}", item.name);

        remove_stale_output(output_path)?;
        let expected_duration_secs = self.expected_duration(item).await;

        let job = EncodeJob {
            input: item.clone(),
            expected_duration_secs,
            output_path: output_path.to_path_buf(),
        };
        self.run(job).await
    }
}
