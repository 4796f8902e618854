//! Acting on a [`DetectionReport`].
//!
//! Detection never touches the filesystem; this module does. It renders the
//! dry-run report, deletes dropped files, or moves them into a quarantine
//! directory. Bad files are only reported, never removed.
//!
//! # Example
//!
//! ```no_run
//! use vdedup::{DetectionOptions, DuplicateDetector};
//! use vdedup::execution::{ExecutionMode, execute, render_report};
//!
//! let detector = DuplicateDetector::new(DetectionOptions::default())?;
//! let report = detector.find_duplicates_in("videos", true)?;
//! print!("{}", render_report(&report));
//!
//! let summary = execute(&report, &ExecutionMode::Move { quarantine: "videos/.dupes".into() });
//! println!("{} moved, {} failed", summary.processed.len(), summary.failures.len());
//! # Ok::<(), vdedup::DedupError>(())
//! ```

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::decision::DetectionReport;
use crate::error::DedupError;

/// What to do with each dropped file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Change nothing.
    DryRun,
    /// Remove dropped files permanently.
    Delete,
    /// Move dropped files into `quarantine`, creating it if needed.
    Move { quarantine: PathBuf },
}

/// Outcome of [`execute`].
#[derive(Debug, Default)]
pub struct ExecutionSummary {
    /// `(source, destination)` per file handled. The destination is `None`
    /// for deletions and dry runs.
    pub processed: Vec<(PathBuf, Option<PathBuf>)>,
    /// One [`DedupError::ExecutionFailed`] per file that could not be handled.
    pub failures: Vec<DedupError>,
}

impl ExecutionSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Apply `mode` to every dropped file in `report`.
///
/// A failure on one file is recorded and the rest are still processed. A
/// file dropped by more than one decision is handled once.
pub fn execute(report: &DetectionReport, mode: &ExecutionMode) -> ExecutionSummary {
    let mut summary = ExecutionSummary::default();
    let mut seen: Vec<&Path> = Vec::new();

    for path in report.dropped() {
        if seen.contains(&path.as_path()) {
            continue;
        }
        seen.push(path);

        let outcome = match mode {
            ExecutionMode::DryRun => Ok(None),
            ExecutionMode::Delete => fs::remove_file(path).map(|()| None),
            ExecutionMode::Move { quarantine } => move_into(path, quarantine).map(Some),
        };

        match outcome {
            Ok(destination) => {
                match &destination {
                    Some(destination) => {
                        log::info!("moved {} -> {}", path.display(), destination.display())
                    }
                    None if *mode == ExecutionMode::Delete => {
                        log::info!("deleted {}", path.display())
                    }
                    None => {}
                }
                summary.processed.push((path.clone(), destination));
            }
            Err(error) => {
                log::warn!("cannot process {}: {error}", path.display());
                summary.failures.push(DedupError::ExecutionFailed {
                    path: path.clone(),
                    reason: error.to_string(),
                });
            }
        }
    }

    summary
}

/// First free path for `file_name` inside `directory`.
///
/// Returns `directory/file_name` when free, otherwise `stem_1.ext`,
/// `stem_2.ext` and so on.
pub fn unique_destination(directory: &Path, file_name: &Path) -> PathBuf {
    let candidate = directory.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = file_name
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = file_name
        .extension()
        .map(|extension| format!(".{}", extension.to_string_lossy()))
        .unwrap_or_default();

    (1u64..)
        .map(|counter| directory.join(format!("{stem}_{counter}{extension}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(candidate)
}

/// Text report of a run: `SKIP:` per bad file, then one `KEEP:`/`DEL :`
/// pair per decision.
pub fn render_report(report: &DetectionReport) -> String {
    let mut text = String::new();

    if !report.bad_files.is_empty() {
        let _ = writeln!(text, "{} unreadable file(s) skipped:", report.bad_files.len());
        for path in &report.bad_files {
            let _ = writeln!(text, "SKIP: {}", path.display());
        }
    }

    if report.decisions.is_empty() {
        let _ = writeln!(text, "No near-duplicate videos found.");
        return text;
    }

    let _ = writeln!(
        text,
        "{} file(s) can be removed (keep the first, drop the second):",
        report.decisions.len()
    );
    for decision in &report.decisions {
        let _ = writeln!(text, "KEEP: {}", decision.keep.display());
        let _ = writeln!(text, "DEL : {}", decision.drop.display());
        text.push('\n');
    }
    text
}

fn move_into(path: &Path, quarantine: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(quarantine)?;
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    let destination = unique_destination(quarantine, Path::new(file_name));

    if fs::rename(path, &destination).is_err() {
        // Renames fail across filesystems; fall back to copy and remove.
        fs::copy(path, &destination)?;
        fs::remove_file(path)?;
    }
    Ok(destination)
}
