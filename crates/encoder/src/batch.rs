//! Batch orchestrator
//!
//! Drives the worklist through the encoder and router one file at a time,
//! then runs the end-of-batch actions.

use crate::encode::{EncodeError, Encoder, VaapiEncoder, VaapiSettings};
use crate::layout::{Layout, LayoutError};
use crate::notify::{NotifyError, NotifySend, Notifier};
use crate::power::{countdown_then_power_off, PowerControl, PowerError, Systemctl};
use crate::queue::{scan, QueueError, ScanOutcome, WorkItem};
use crate::route::{route, RouteError, RoutingOutcome};
use crate::startup::{check_dependencies, StartupError};
use encoder_config::{BatchFlags, Config, ConfigError};
use log::info;
use std::time::Duration;
use thiserror::Error;

/// Error type for batch operations
#[derive(Debug, Error)]
pub enum BatchError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Startup check failed
    #[error(transparent)]
    Startup(#[from] StartupError),

    /// Directory setup failed
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Intake scan or classification failed
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// The intake directory held nothing at all
    #[error("Input dir is empty")]
    EmptyQueue,

    /// An encode failed; the batch stops here
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Moving or deleting a finished file failed
    #[error("Routing failed: {0}")]
    Route(#[from] RouteError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error(transparent)]
    Power(#[from] PowerError),
}

/// Counters for the batch in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchState {
    pub total_items: usize,
    pub processed_count: usize,
}

impl BatchState {
    pub fn new(total_items: usize) -> Self {
        Self {
            total_items,
            processed_count: 0,
        }
    }

    /// Marks the next item as started and returns its banner.
    pub fn advance(&mut self) -> String {
        self.processed_count += 1;
        format!(
            "---------- Progress: {} of {} ----------",
            self.processed_count, self.total_items
        )
    }
}

/// What happened during a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total_items: usize,
    pub processed: usize,
    /// Entries classified away from the worklist
    pub skipped: usize,
    /// Routing outcome per encoded file, in processing order (empty on dry runs)
    pub outcomes: Vec<(String, RoutingOutcome)>,
}

impl BatchSummary {
    pub fn regressions(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_regression()).count()
    }
}

/// Settings for the end-of-batch actions
#[derive(Debug, Clone)]
pub struct FinishSettings {
    pub message: String,
    pub poweroff_delay_secs: u32,
    /// Length of one countdown step
    pub tick: Duration,
}

impl FinishSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            message: config.notify.message.clone(),
            poweroff_delay_secs: config.poweroff.delay_secs,
            tick: Duration::from_secs(1),
        }
    }
}

/// One batch run with its collaborators
pub struct Batch<'a, E, N, P> {
    layout: &'a Layout,
    flags: &'a BatchFlags,
    encoder: E,
    notifier: N,
    power: P,
    finish: FinishSettings,
}

impl<'a, E, N, P> Batch<'a, E, N, P>
where
    E: Encoder,
    N: Notifier,
    P: PowerControl,
{
    pub fn new(
        layout: &'a Layout,
        flags: &'a BatchFlags,
        encoder: E,
        notifier: N,
        power: P,
        finish: FinishSettings,
    ) -> Self {
        Self {
            layout,
            flags,
            encoder,
            notifier,
            power,
            finish,
        }
    }

    /// Run the batch for one scan of the intake directory
    ///
    /// An intake directory with no entries at all is an error. One whose
    /// entries were all skipped finishes quietly without end-of-batch
    /// actions.
    pub async fn run(&self, scanned: ScanOutcome) -> Result<BatchSummary, BatchError> {
        if scanned.is_empty() {
            return Err(BatchError::EmptyQueue);
        }

        if scanned.worklist.is_empty() {
            info!("All {} entries skipped, nothing to encode", scanned.rejected);
            return Ok(BatchSummary {
                skipped: scanned.rejected,
                ..BatchSummary::default()
            });
        }

        let mut summary = self.process(&scanned.worklist).await?;
        summary.skipped = scanned.rejected;

        self.finish().await?;
        Ok(summary)
    }

    /// Processes the worklist strictly in order
    ///
    /// The first encode or routing failure stops the batch; nothing after
    /// the failing item is touched.
    pub async fn process(&self, worklist: &[WorkItem]) -> Result<BatchSummary, BatchError> {
        let mut state = BatchState::new(worklist.len());
        let mut summary = BatchSummary {
            total_items: worklist.len(),
            ..BatchSummary::default()
        };

        for item in worklist {
            info!("{}", state.advance());

            if self.flags.dry_run {
                info!("dry run {}", item.name);
                summary.processed += 1;
                continue;
            }

            let output_path = self.layout.output_file(&item.name);
            let result = self.encoder.encode(item, &output_path).await?;
            let outcome = route(item, &result, self.layout, self.flags)?;

            summary.outcomes.push((item.name.clone(), outcome));
            summary.processed += 1;
        }

        Ok(summary)
    }

    /// Notification (or log line), then the optional power-off countdown
    pub async fn finish(&self) -> Result<(), BatchError> {
        if self.flags.notify_on_finish && !self.flags.dry_run {
            self.notifier.notify(&self.finish.message).await?;
        } else {
            info!("{}", self.finish.message);
        }

        if self.flags.power_off {
            if self.flags.dry_run {
                info!(
                    "dry run: would poweroff in {} seconds",
                    self.finish.poweroff_delay_secs
                );
            } else {
                countdown_then_power_off(
                    self.finish.poweroff_delay_secs,
                    self.finish.tick,
                    &self.power,
                )
                .await?;
            }
        }

        Ok(())
    }
}

/// Runs a complete batch with the real tools
///
/// Pre-flight, directory setup, intake scan, then the batch itself.
pub async fn run(config: &Config, flags: &BatchFlags) -> Result<BatchSummary, BatchError> {
    check_dependencies(config, flags).await?;

    let layout = Layout::new(config.state_dir()?);
    layout.ensure()?;

    let scanned = scan(&layout, &config.encoder.extensions, flags.dry_run)?;

    let batch = Batch::new(
        &layout,
        flags,
        VaapiEncoder::new(VaapiSettings::from_config(config)),
        NotifySend::new(config.tools.notify_send.clone(), &config.notify),
        Systemctl::new(config.tools.systemctl.clone()),
        FinishSettings::from_config(config),
    );
    batch.run(scanned).await
}
