//! Delayed system power-off.

use crate::process::run_captured;
use log::info;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum PowerError {
    #[error("Failed to poweroff system: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to poweroff system: exited with code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
}

/// Issues the actual shutdown.
#[allow(async_fn_in_trait)]
pub trait PowerControl {
    async fn power_off(&self) -> Result<(), PowerError>;
}

/// `systemctl poweroff`
#[derive(Debug, Clone)]
pub struct Systemctl {
    program: String,
}

impl Systemctl {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PowerControl for Systemctl {
    async fn power_off(&self) -> Result<(), PowerError> {
        let result = run_captured(Command::new(&self.program).arg("poweroff")).await?;
        if !result.success() {
            return Err(PowerError::Failed {
                code: result.exit_code,
                stderr: result.stderr.trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Counts down `secs` ticks, logging each one, then powers off once.
pub async fn countdown_then_power_off<P: PowerControl>(
    secs: u32,
    tick: Duration,
    power: &P,
) -> Result<(), PowerError> {
    let mut remaining = secs;
    while remaining > 0 {
        info!("System will poweroff in {} seconds", remaining);
        tokio::time::sleep(tick).await;
        remaining -= 1;
    }
    power.power_off().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct RecordingPower {
        calls: Cell<u32>,
    }

    impl PowerControl for RecordingPower {
        async fn power_off(&self) -> Result<(), PowerError> {
            self.calls.set(self.calls.get() + 1);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_countdown_powers_off_exactly_once() {
        let power = RecordingPower::default();
        countdown_then_power_off(3, Duration::ZERO, &power).await.unwrap();
        assert_eq!(power.calls.get(), 1);
    }

    #[tokio::test]
    async fn test_zero_delay_powers_off_immediately() {
        let power = RecordingPower::default();
        countdown_then_power_off(0, Duration::from_secs(3600), &power)
            .await
            .unwrap();
        assert_eq!(power.calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_waits_one_tick_per_second() {
        let power = RecordingPower::default();
        let started = tokio::time::Instant::now();

        countdown_then_power_off(30, Duration::from_secs(1), &power)
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_secs(30));
        assert_eq!(power.calls.get(), 1);
    }

    #[tokio::test]
    async fn test_failing_power_control_is_error() {
        let power = Systemctl::new("false");
        assert!(matches!(
            countdown_then_power_off(0, Duration::ZERO, &power).await,
            Err(PowerError::Failed { .. })
        ));
    }
}
