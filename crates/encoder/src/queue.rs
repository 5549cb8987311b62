//! Directory queue for the intake directory.
//!
//! Lists the intake directory once, keeps video files as the worklist and
//! moves everything else to the skipped directory on the spot.

use crate::layout::Layout;
use crate::route::move_file;
use log::info;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Errors that can occur while scanning the intake directory.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The intake directory could not be listed.
    #[error("Failed to read intake directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A rejected entry could not be moved to the skipped directory.
    #[error("Failed to move {name} to skipped dir: {source}")]
    Classification {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// One candidate file from the intake directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// File name inside the intake directory.
    pub name: String,
    /// Full path of the file in the intake directory.
    pub source_path: PathBuf,
    /// Lowercased extension, without the dot.
    pub extension: String,
}

/// Result of one pass over the intake directory.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Accepted items, in directory enumeration order.
    pub worklist: Vec<WorkItem>,
    /// Entries moved (or, in dry-run mode, due to be moved) to skipped.
    pub rejected: usize,
}

impl ScanOutcome {
    /// True when the intake directory held nothing at all.
    pub fn is_empty(&self) -> bool {
        self.worklist.is_empty() && self.rejected == 0
    }
}

/// Returns the lowercased extension of `path` if it is in `allowed`.
pub fn video_extension(path: &Path, allowed: &[String]) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    allowed
        .iter()
        .any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(&ext))
        .then_some(ext)
}

/// Scans the intake directory and partitions its entries.
///
/// Entries are visited in the order the filesystem lists them; no sorting
/// is applied. Only regular files (or links to them) with an allowed
/// extension and a UTF-8 name become work items. Everything else is moved to the skipped
/// directory immediately, unless `dry_run` is set, in which case the move
/// is only reported.
pub fn scan(layout: &Layout, extensions: &[String], dry_run: bool) -> Result<ScanOutcome, QueueError> {
    let mut outcome = ScanOutcome::default();

    let walker = WalkDir::new(&layout.input).min_depth(1).max_depth(1);

    for entry in walker {
        let entry = entry.map_err(|source| QueueError::ReadDir {
            path: layout.input.clone(),
            source,
        })?;
        let path = entry.path();

        // Follows symlinks, so a linked video is queued like a plain one
        let accepted = path
            .is_file()
            .then(|| video_extension(path, extensions))
            .flatten()
            .zip(entry.file_name().to_str());

        if let Some((extension, name)) = accepted {
            outcome.worklist.push(WorkItem {
                name: name.to_string(),
                source_path: path.to_path_buf(),
                extension,
            });
            continue;
        }

        let display_name = entry.file_name().to_string_lossy().into_owned();
        outcome.rejected += 1;

        if dry_run {
            info!("dry run: would move {} to skipped dir", display_name);
            continue;
        }

        move_file(path, &layout.skipped_file(Path::new(entry.file_name()))).map_err(
            |source| QueueError::Classification {
                name: display_name.clone(),
                source,
            },
        )?;
        info!("Moved {} to skipped dir", display_name);
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn default_extensions() -> Vec<String> {
        vec!["mp4".to_string(), "mkv".to_string(), "ts".to_string()]
    }

    fn prepared_layout() -> (TempDir, Layout) {
        let temp_dir = TempDir::new().unwrap();
        let layout = Layout::new(temp_dir.path());
        layout.ensure().unwrap();
        (temp_dir, layout)
    }

    #[test]
    fn test_video_extension() {
        let exts = default_extensions();
        assert_eq!(video_extension(Path::new("a.mkv"), &exts), Some("mkv".to_string()));
        assert_eq!(video_extension(Path::new("a.MP4"), &exts), Some("mp4".to_string()));
        assert_eq!(video_extension(Path::new("rec.ts"), &exts), Some("ts".to_string()));
        assert_eq!(video_extension(Path::new("notes.txt"), &exts), None);
        assert_eq!(video_extension(Path::new("mkv"), &exts), None); // no extension
        // A bare suffix match is not an extension match
        assert_eq!(video_extension(Path::new("gifts"), &exts), None);
        assert_eq!(video_extension(Path::new("body.parts"), &exts), None);
    }

    #[test]
    fn test_video_extension_accepts_dotted_config_entries() {
        let exts = vec![".mkv".to_string()];
        assert_eq!(video_extension(Path::new("a.mkv"), &exts), Some("mkv".to_string()));
    }

    #[test]
    fn test_scan_partitions_and_moves_rejects() {
        let (_temp, layout) = prepared_layout();
        File::create(layout.input_file("one.mkv")).unwrap();
        File::create(layout.input_file("two.mp4")).unwrap();
        File::create(layout.input_file("cover.jpg")).unwrap();
        File::create(layout.input_file("readme")).unwrap();

        let outcome = scan(&layout, &default_extensions(), false).unwrap();

        let mut names: Vec<_> = outcome.worklist.iter().map(|w| w.name.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["one.mkv", "two.mp4"]);
        assert_eq!(outcome.rejected, 2);

        assert!(layout.skipped.join("cover.jpg").exists());
        assert!(layout.skipped.join("readme").exists());
        assert!(!layout.input_file("cover.jpg").exists());
        assert!(layout.input_file("one.mkv").exists());
    }

    #[test]
    fn test_scan_populates_work_item() {
        let (_temp, layout) = prepared_layout();
        File::create(layout.input_file("Show.MKV")).unwrap();

        let outcome = scan(&layout, &default_extensions(), false).unwrap();

        assert_eq!(
            outcome.worklist,
            vec![WorkItem {
                name: "Show.MKV".to_string(),
                source_path: layout.input_file("Show.MKV"),
                extension: "mkv".to_string(),
            }]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_queues_symlinked_video() {
        let (temp_dir, layout) = prepared_layout();
        let target = temp_dir.path().join("library-movie.mkv");
        fs::write(&target, b"video").unwrap();
        std::os::unix::fs::symlink(&target, layout.input.join("movie.mkv")).unwrap();

        let outcome = scan(&layout, &default_extensions(), false).unwrap();

        assert_eq!(outcome.worklist.len(), 1);
        assert_eq!(outcome.worklist[0].name, "movie.mkv");
        assert_eq!(outcome.rejected, 0);
        assert!(!layout.skipped.join("movie.mkv").exists());
    }

    #[test]
    fn test_scan_moves_directories_to_skipped() {
        let (_temp, layout) = prepared_layout();
        fs::create_dir(layout.input_file("season.mkv")).unwrap();

        let outcome = scan(&layout, &default_extensions(), false).unwrap();

        assert!(outcome.worklist.is_empty());
        assert_eq!(outcome.rejected, 1);
        assert!(layout.skipped.join("season.mkv").is_dir());
    }

    #[test]
    fn test_scan_dry_run_leaves_rejects_in_place() {
        let (_temp, layout) = prepared_layout();
        File::create(layout.input_file("cover.jpg")).unwrap();
        File::create(layout.input_file("one.mkv")).unwrap();

        let outcome = scan(&layout, &default_extensions(), true).unwrap();

        assert_eq!(outcome.worklist.len(), 1);
        assert_eq!(outcome.rejected, 1);
        assert!(layout.input_file("cover.jpg").exists());
        assert!(!layout.skipped.join("cover.jpg").exists());
    }

    #[test]
    fn test_scan_empty_intake() {
        let (_temp, layout) = prepared_layout();
        let outcome = scan(&layout, &default_extensions(), false).unwrap();
        assert!(outcome.is_empty());
    }

    #[test]
    fn test_scan_only_rejects_is_not_empty() {
        let (_temp, layout) = prepared_layout();
        File::create(layout.input_file("notes.txt")).unwrap();

        let outcome = scan(&layout, &default_extensions(), false).unwrap();
        assert!(outcome.worklist.is_empty());
        assert!(!outcome.is_empty());
    }

    #[test]
    fn test_scan_missing_intake_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let layout = Layout::new(temp_dir.path().join("absent"));

        let result = scan(&layout, &default_extensions(), false);
        assert!(matches!(result, Err(QueueError::ReadDir { .. })));
    }

    #[test]
    fn test_scan_fails_when_skipped_dir_missing() {
        let (_temp, layout) = prepared_layout();
        File::create(layout.input_file("cover.jpg")).unwrap();
        fs::remove_dir(&layout.skipped).unwrap();

        let result = scan(&layout, &default_extensions(), false);
        assert!(matches!(result, Err(QueueError::Classification { ref name, .. }) if name == "cover.jpg"));
    }

    // Every worklist entry has an allowed extension; every other entry ends up in skipped/.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(30))]

        #[test]
        fn prop_classification_partitions_entries(
            entries in proptest::collection::hash_set(
                ("[a-z0-9]{1,8}", prop_oneof![
                    Just("mkv"), Just("MP4"), Just("ts"),
                    Just("txt"), Just("srt"), Just("jpg"), Just("nfo"),
                ]),
                1..12,
            ),
        ) {
            let (_temp, layout) = prepared_layout();
            let exts = default_extensions();
            let names: Vec<String> = entries
                .iter()
                .map(|(stem, ext)| format!("{}.{}", stem, ext))
                .collect::<std::collections::HashSet<_>>()
                .into_iter()
                .collect();
            for name in &names {
                File::create(layout.input_file(name)).unwrap();
            }

            let outcome = scan(&layout, &exts, false).unwrap();

            for item in &outcome.worklist {
                prop_assert!(video_extension(&item.source_path, &exts).is_some());
                prop_assert!(item.source_path.exists());
            }
            let mut rejected = 0;
            for name in &names {
                if video_extension(Path::new(name), &exts).is_none() {
                    rejected += 1;
                    prop_assert!(layout.skipped.join(name).exists());
                    prop_assert!(!layout.input_file(name).exists());
                }
            }
            prop_assert_eq!(outcome.rejected, rejected);
            prop_assert_eq!(outcome.worklist.len() + outcome.rejected, names.len());
        }
    }
}
