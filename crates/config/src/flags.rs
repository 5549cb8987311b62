//! Per-run policy flags
//!
//! Built once from the command line and passed by reference to every
//! component of the batch.

/// Policy flags for one batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchFlags {
    /// Report intent only: no subprocesses, no file moves or deletes
    pub dry_run: bool,
    /// Delete the original after a successful encode instead of moving it to trash
    pub delete_input_after_success: bool,
    /// Delete an encode that came out larger instead of keeping it as `new-<name>`
    pub delete_output_if_larger: bool,
    /// Send a desktop notification when the batch finishes
    pub notify_on_finish: bool,
    /// Power the system off after the batch finishes
    pub power_off: bool,
}
