//! Probe-only validation gate.
//!
//! When [`DetectionOptions::with_validation`](crate::DetectionOptions::with_validation)
//! is enabled, every file is probed before signing and checked with
//! [`validate_metadata`]. A file whose [`ValidationReport`] carries errors is
//! recorded as a bad file and never reaches the signature builder.
//!
//! # Example
//!
//! ```no_run
//! use vdedup::{MediaProbe, validate_metadata};
//!
//! let metadata = MediaProbe::probe("input.mp4")?;
//! let report = validate_metadata(&metadata);
//! if !report.is_valid() {
//!     print!("{report}");
//! }
//! # Ok::<(), vdedup::DedupError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

use crate::metadata::MediaMetadata;

/// Summary of media file validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Non-fatal issues that may affect sampling quality.
    pub warnings: Vec<String>,
    /// Fatal issues: the file is treated as unreadable.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Returns `true` if no errors were found. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of issues (info + warnings + errors).
    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}

/// Check probed metadata for a readable video stream.
///
/// A file is valid when it has a video stream with non-zero width and
/// height. A zero duration is only a warning: sampling degrades to a single
/// frame at the start.
pub fn validate_metadata(metadata: &MediaMetadata) -> ValidationReport {
    let mut report = ValidationReport::default();

    if !metadata.has_video {
        report.errors.push("No video stream found".to_string());
        return report;
    }

    if !metadata.resolution.is_known() {
        report.errors.push(format!(
            "Invalid video dimensions: {}",
            metadata.resolution,
        ));
    }

    if metadata.duration == Duration::ZERO {
        report
            .warnings
            .push("Media duration is zero or unknown; only the first frame will be sampled".to_string());
    }

    if let Some(format) = &metadata.format {
        report.info.push(format!("Container: {format}"));
    }

    report.info.push(format!(
        "Video: {} {} over {:.2}s",
        metadata.codec.as_deref().unwrap_or("unknown codec"),
        metadata.resolution,
        metadata.duration.as_secs_f64(),
    ));

    report
}
