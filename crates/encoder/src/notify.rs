//! Desktop notification at the end of a batch.

use crate::process::run_captured;
use encoder_config::NotifyConfig;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to notify: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to notify: notifier exited with code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
}

/// Sends a one-line message to the user.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

/// Notifier backed by `notify-send`
#[derive(Debug, Clone)]
pub struct NotifySend {
    program: String,
    app_name: String,
    timeout_ms: u32,
}

impl NotifySend {
    pub fn new(program: impl Into<String>, config: &NotifyConfig) -> Self {
        Self {
            program: program.into(),
            app_name: config.app_name.clone(),
            timeout_ms: config.timeout_ms,
        }
    }

    /// `notify-send -a <app> -t <timeout> <message>`
    pub fn build_command(&self, message: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-a").arg(&self.app_name);
        cmd.arg("-t").arg(self.timeout_ms.to_string());
        cmd.arg(message);
        cmd
    }
}

impl Notifier for NotifySend {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let result = run_captured(&mut self.build_command(message)).await?;
        if !result.success() {
            return Err(NotifyError::Failed {
                code: result.exit_code,
                stderr: result.stderr.trim().to_string(),
            });
        }
        Ok(())
    }
}
