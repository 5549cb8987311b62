//! Outcome router for finished encodes.
//!
//! Compares input and output sizes and moves or deletes both files so
//! each ends in exactly one terminal directory.

use crate::encode::EncodeResult;
use crate::layout::Layout;
use crate::queue::WorkItem;
use crate::size_gate::check_size_gate;
use encoder_config::BatchFlags;
use log::info;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while routing a finished encode.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Failed to move a file to its terminal directory.
    #[error("Failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to delete a file.
    #[error("Failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where one file of an encode pair ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Original moved to `trash/` after a successful encode.
    Trashed,
    /// Original deleted after a successful encode.
    Deleted,
    /// Original moved to `fails/` because its encode was larger.
    MovedToFails,
    /// Larger encode moved to `fails/new-<name>`.
    MovedToFailsAsNew,
    /// Larger encode deleted.
    DeletedAsLarge,
}

/// Decisions for both files of one encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingOutcome {
    pub input: RoutingDecision,
    /// `None` when the encode stays in `output/`.
    pub output: Option<RoutingDecision>,
}

impl RoutingOutcome {
    pub fn is_regression(&self) -> bool {
        self.input == RoutingDecision::MovedToFails
    }
}

/// Pure routing policy.
///
/// A strictly larger output is a regression: the original goes to `fails/`
/// and the output is deleted or kept as `new-<name>`. Anything else is a
/// success: the original is deleted or trashed and the output stays put.
pub fn decide(input_bytes: u64, output_bytes: u64, flags: &BatchFlags) -> RoutingOutcome {
    if check_size_gate(input_bytes, output_bytes).is_regression() {
        RoutingOutcome {
            input: RoutingDecision::MovedToFails,
            output: Some(if flags.delete_output_if_larger {
                RoutingDecision::DeletedAsLarge
            } else {
                RoutingDecision::MovedToFailsAsNew
            }),
        }
    } else {
        RoutingOutcome {
            input: if flags.delete_input_after_success {
                RoutingDecision::Deleted
            } else {
                RoutingDecision::Trashed
            },
            output: None,
        }
    }
}

/// Moves a file, falling back to copy and delete across filesystems.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    if from.is_dir() {
        // Only a same-filesystem rename can move a directory; report why it failed.
        return fs::rename(from, to);
    }
    fs::copy(from, to)?;
    fs::remove_file(from)
}

fn relocate(from: &Path, to: PathBuf) -> Result<(), RouteError> {
    move_file(from, &to).map_err(|source| RouteError::Move {
        from: from.to_path_buf(),
        to,
        source,
    })
}

fn delete(path: &Path) -> Result<(), RouteError> {
    fs::remove_file(path).map_err(|source| RouteError::Delete {
        path: path.to_path_buf(),
        source,
    })
}

/// Applies the routing policy to a finished encode.
///
/// On a regression the original is moved to `fails/` before the output is
/// touched, and nothing goes to `trash/` in the same pass.
pub fn route(
    item: &WorkItem,
    result: &EncodeResult,
    layout: &Layout,
    flags: &BatchFlags,
) -> Result<RoutingOutcome, RouteError> {
    let outcome = decide(result.input_size_bytes, result.output_size_bytes, flags);

    if outcome.is_regression() {
        info!(
            "New encoded file is larger ({} > {} bytes)",
            result.output_size_bytes, result.input_size_bytes
        );

        relocate(&item.source_path, layout.fails_file(&item.name))?;
        info!("Moved old file to fails dir");

        if flags.delete_output_if_larger {
            delete(&result.output_path)?;
            info!("Deleted new file");
        } else {
            relocate(&result.output_path, layout.fails_new_file(&item.name))?;
            info!("Moved new file to fails dir");
        }
    } else if flags.delete_input_after_success {
        delete(&item.source_path)?;
        info!("Deleted old file");
    } else {
        relocate(&item.source_path, layout.trash_file(&item.name))?;
        info!("Moved old file to trash dir");
    }

    Ok(outcome)
}
