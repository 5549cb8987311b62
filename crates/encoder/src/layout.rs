//! State directory layout.
//!
//! All work happens below a single per-user state directory holding the
//! intake directory and the four terminal directories.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix given to an oversized encode kept next to its original in `fails/`.
pub const FAILS_NEW_PREFIX: &str = "new-";

/// Errors that can occur while preparing the directory tree.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// A required directory could not be created.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Paths of the intake and terminal directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub root: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
    pub fails: PathBuf,
    pub skipped: PathBuf,
    pub trash: PathBuf,
}

impl Layout {
    /// Builds the layout below `root` without touching the filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            input: root.join("input"),
            output: root.join("output"),
            fails: root.join("fails"),
            skipped: root.join("skipped"),
            trash: root.join("trash"),
            root,
        }
    }

    /// Creates the root and every subdirectory that does not exist yet.
    pub fn ensure(&self) -> Result<(), LayoutError> {
        for dir in [
            &self.root,
            &self.fails,
            &self.input,
            &self.output,
            &self.skipped,
            &self.trash,
        ] {
            if dir.is_dir() {
                continue;
            }
            fs::create_dir_all(dir).map_err(|source| LayoutError::CreateDir {
                path: dir.clone(),
                source,
            })?;
            log::debug!("Created {}", dir.display());
        }
        Ok(())
    }

    pub fn input_file(&self, name: &str) -> PathBuf {
        self.input.join(name)
    }

    pub fn output_file(&self, name: &str) -> PathBuf {
        self.output.join(name)
    }

    pub fn fails_file(&self, name: &str) -> PathBuf {
        self.fails.join(name)
    }

    /// `fails/new-<name>`, where a larger encode is kept beside its original.
    pub fn fails_new_file(&self, name: &str) -> PathBuf {
        self.fails.join(format!("{}{}", FAILS_NEW_PREFIX, name))
    }

    pub fn trash_file(&self, name: &str) -> PathBuf {
        self.trash.join(name)
    }

    pub fn skipped_file(&self, name: &Path) -> PathBuf {
        self.skipped.join(name)
    }
}
