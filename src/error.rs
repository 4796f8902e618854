//! Error types for the `vdedup` crate.
//!
//! This module defines [`DedupError`], the unified error type returned by all
//! fallible operations in the crate. Most variants describe a failure that is
//! contained to one file: the detector turns them into bad-file entries and
//! keeps going. Only [`DedupError::Cancelled`] and
//! [`DedupError::InvalidConfiguration`] end a run.

use std::{io::Error as IoError, path::PathBuf, process::ExitStatus, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `vdedup` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DedupError {
    /// The media file could not be opened by the in-process demuxer.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path of the file that failed to open.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in {0}")]
    NoVideoStream(PathBuf),

    /// A single frame could not be decoded at the requested timestamp.
    ///
    /// Recoverable: counted toward the fail ratio of the current tier.
    #[error("Failed to decode frame of {path} at {timestamp:.3}s: {reason}")]
    DecodeFailure {
        /// File being sampled.
        path: PathBuf,
        /// Requested timestamp in seconds.
        timestamp: f64,
        /// What went wrong.
        reason: String,
    },

    /// Container metadata was unavailable.
    #[error("Failed to probe {path}: {reason}")]
    ProbeFailure {
        /// File being probed.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Every tier of the signature chain was exhausted.
    #[error("No signature could be produced for {path}")]
    SignatureUnavailable {
        /// The unsignable file.
        path: PathBuf,
    },

    /// An external decode or probe binary could not be started.
    #[error("External tool `{tool}` is not available")]
    ExternalToolMissing {
        /// Program name or path that was invoked.
        tool: String,
    },

    /// An external tool did not finish within its deadline and was killed.
    #[error("External tool `{tool}` timed out after {timeout:?}")]
    ExternalToolTimeout {
        /// Program name or path that was invoked.
        tool: String,
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// An external tool exited unsuccessfully or produced unusable output.
    #[error("External tool `{tool}` failed ({status:?}): {reason}")]
    ExternalToolFailed {
        /// Program name or path that was invoked.
        tool: String,
        /// Exit status, if the process exited at all.
        status: Option<ExitStatus>,
        /// Short description of the failure.
        reason: String,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while decoding an emitted still.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The run was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// A [`DetectionOptions`](crate::DetectionOptions) value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The execution layer could not delete or move a file.
    #[error("Failed to act on {path}: {reason}")]
    ExecutionFailed {
        /// File the action was applied to.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },
}

impl From<FfmpegError> for DedupError {
    fn from(error: FfmpegError) -> Self {
        DedupError::FfmpegError(error.to_string())
    }
}
