//! Batch Encoder
//!
//! Scans an intake directory, transcodes each video with VAAPI-accelerated
//! ffmpeg, and routes originals and encodes into terminal directories by size.

pub mod batch;
pub mod encode;
pub mod layout;
pub mod notify;
pub mod power;
pub mod probe;
pub mod process;
pub mod progress;
pub mod queue;
pub mod route;
pub mod size_gate;
pub mod startup;

pub use batch::{run, Batch, BatchError, BatchState, BatchSummary, FinishSettings};
pub use encode::{EncodeError, EncodeJob, EncodeResult, Encoder, VaapiEncoder, VaapiSettings};
pub use encoder_config as config;
pub use encoder_config::{BatchFlags, Config};
pub use layout::{Layout, LayoutError};
pub use notify::{NotifyError, NotifySend, Notifier};
pub use power::{countdown_then_power_off, PowerControl, PowerError, Systemctl};
pub use probe::{probe_duration, ProbeError};
pub use process::ProcessResult;
pub use progress::ProgressReporter;
pub use queue::{scan, QueueError, ScanOutcome, WorkItem};
pub use route::{decide, route, RouteError, RoutingDecision, RoutingOutcome};
pub use size_gate::{check_size_gate, SizeGateResult};
pub use startup::{check_dependencies, StartupError};
