//! Detection configuration.
//!
//! [`DetectionOptions`] is a builder that threads sampling, clustering,
//! external-tool, and operational settings (progress, cancellation, worker
//! count) through a detection run without polluting every function
//! signature.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use vdedup::{CancellationToken, DetectionOptions};
//!
//! let token = CancellationToken::new();
//! let options = DetectionOptions::new()
//!     .with_sample_count(12)
//!     .with_hash_threshold(6.0)
//!     .with_probe_timeout(Duration::from_secs(10))
//!     .with_cancellation(token.clone());
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::DedupError;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Frames sampled per file unless configured otherwise.
pub const DEFAULT_SAMPLE_COUNT: usize = 8;
/// Failed-sample fraction above which a decode tier is abandoned.
pub const DEFAULT_MAX_FAIL_RATIO: f64 = 0.5;
/// Duration bucket width and pairwise duration gate, in seconds.
pub const DEFAULT_DURATION_TOLERANCE: f64 = 0.5;
/// Maximum mean Hamming distance for two files to be near-duplicates.
pub const DEFAULT_HASH_THRESHOLD: f64 = 8.0;
/// Raw bytes hashed for a minimal signature.
pub const DEFAULT_CONTENT_PREFIX_BYTES: usize = 64 * 1024;
/// Extensions (lowercase, without dot) recognised as video files.
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "m4v", "webm"];

/// Configuration for a detection run.
///
/// All fields have defaults matching the reference behaviour: 8 samples,
/// 0.5 fail ratio, 0.5 s duration tolerance, threshold 8, no validation gate,
/// 15 s timeouts for external tools.
#[derive(Clone)]
pub struct DetectionOptions {
    pub(crate) sample_count: usize,
    pub(crate) max_fail_ratio: f64,
    pub(crate) duration_tolerance: f64,
    pub(crate) hash_threshold: f64,
    pub(crate) validate: bool,
    pub(crate) content_prefix_bytes: usize,
    pub(crate) ffmpeg_program: PathBuf,
    pub(crate) ffprobe_program: PathBuf,
    pub(crate) probe_timeout: Duration,
    pub(crate) frame_timeout: Duration,
    pub(crate) threads: Option<usize>,
    pub(crate) video_extensions: Vec<String>,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl Debug for DetectionOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DetectionOptions")
            .field("sample_count", &self.sample_count)
            .field("max_fail_ratio", &self.max_fail_ratio)
            .field("duration_tolerance", &self.duration_tolerance)
            .field("hash_threshold", &self.hash_threshold)
            .field("validate", &self.validate)
            .field("content_prefix_bytes", &self.content_prefix_bytes)
            .field("ffmpeg_program", &self.ffmpeg_program)
            .field("ffprobe_program", &self.ffprobe_program)
            .field("probe_timeout", &self.probe_timeout)
            .field("frame_timeout", &self.frame_timeout)
            .field("threads", &self.threads)
            .field("video_extensions", &self.video_extensions)
            .field("has_cancellation", &self.cancellation.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            max_fail_ratio: DEFAULT_MAX_FAIL_RATIO,
            duration_tolerance: DEFAULT_DURATION_TOLERANCE,
            hash_threshold: DEFAULT_HASH_THRESHOLD,
            validate: false,
            content_prefix_bytes: DEFAULT_CONTENT_PREFIX_BYTES,
            ffmpeg_program: PathBuf::from("ffmpeg"),
            ffprobe_program: PathBuf::from("ffprobe"),
            probe_timeout: Duration::from_secs(15),
            frame_timeout: Duration::from_secs(15),
            threads: None,
            video_extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            progress: Arc::new(NoOpProgress),
            cancellation: None,
        }
    }
}

impl DetectionOptions {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames sampled per file.
    pub fn with_sample_count(mut self, count: usize) -> Self {
        self.sample_count = count;
        self
    }

    /// Fraction of failed samples (0.0 – 1.0) above which a tier is abandoned.
    pub fn with_max_fail_ratio(mut self, ratio: f64) -> Self {
        self.max_fail_ratio = ratio;
        self
    }

    /// Duration tolerance in seconds.
    pub fn with_duration_tolerance(mut self, seconds: f64) -> Self {
        self.duration_tolerance = seconds;
        self
    }

    /// Maximum mean Hamming distance for admission into a cluster.
    pub fn with_hash_threshold(mut self, threshold: f64) -> Self {
        self.hash_threshold = threshold;
        self
    }

    /// Enable the probe-only gate run before signing.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Number of leading file bytes hashed for a minimal signature.
    pub fn with_content_prefix_bytes(mut self, bytes: usize) -> Self {
        self.content_prefix_bytes = bytes;
        self
    }

    /// Program used for external frame extraction.
    pub fn with_ffmpeg_program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.ffmpeg_program = program.into();
        self
    }

    /// Program used for external metadata probing.
    pub fn with_ffprobe_program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.ffprobe_program = program.into();
        self
    }

    /// Deadline for one metadata probe subprocess.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Deadline for one frame extraction subprocess.
    pub fn with_frame_timeout(mut self, timeout: Duration) -> Self {
        self.frame_timeout = timeout;
        self
    }

    /// Size of the signing worker pool. `None` uses rayon's global pool.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads.filter(|&count| count > 0);
        self
    }

    /// Replace the recognised video extensions (case-insensitive, no dot).
    pub fn with_video_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.video_extensions = extensions
            .into_iter()
            .map(|ext| ext.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Set a progress callback.
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn max_fail_ratio(&self) -> f64 {
        self.max_fail_ratio
    }

    pub fn duration_tolerance(&self) -> f64 {
        self.duration_tolerance
    }

    pub fn hash_threshold(&self) -> f64 {
        self.hash_threshold
    }

    pub fn validation_enabled(&self) -> bool {
        self.validate
    }

    pub fn video_extensions(&self) -> &[String] {
        &self.video_extensions
    }

    /// Check whether cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }

    /// Reject values that would make sampling or clustering meaningless.
    ///
    /// # Errors
    ///
    /// Returns [`DedupError::InvalidConfiguration`] describing the first
    /// offending field.
    pub fn validate(&self) -> Result<(), DedupError> {
        if self.sample_count == 0 {
            return Err(DedupError::InvalidConfiguration(
                "sample count must be greater than zero".to_string(),
            ));
        }
        if !self.duration_tolerance.is_finite() || self.duration_tolerance <= 0.0 {
            return Err(DedupError::InvalidConfiguration(format!(
                "duration tolerance must be a positive number of seconds, got {}",
                self.duration_tolerance
            )));
        }
        if !self.hash_threshold.is_finite() || self.hash_threshold < 0.0 {
            return Err(DedupError::InvalidConfiguration(format!(
                "hash threshold must be non-negative, got {}",
                self.hash_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.max_fail_ratio) {
            return Err(DedupError::InvalidConfiguration(format!(
                "max fail ratio must lie in [0, 1], got {}",
                self.max_fail_ratio
            )));
        }
        Ok(())
    }
}
