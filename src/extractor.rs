//! Frame extraction tiers.
//!
//! A [`FrameSource`] opens a [`FrameSession`] for one file; the session
//! reports the file's duration and decodes single frames at timestamps.
//! Every failure inside a session is returned as a value
//! ([`DedupError::DecodeFailure`] for one unreadable timestamp), so the
//! signature builder can keep sampling other timestamps.
//!
//! Two tiers are provided, tried in this order by the default
//! [`SignatureBuilder`](crate::SignatureBuilder):
//!
//! - [`InProcessSource`] decodes with the linked FFmpeg libraries.
//! - [`ExternalSource`] runs the `ffmpeg` program once per timestamp, seeking
//!   before opening the input, and reads back a single PNG still.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use image::DynamicImage;

use crate::error::DedupError;
use crate::external;
use crate::media::MediaFile;
use crate::probe::{FfprobeProbe, MetadataProbe};

/// One decode path for video frames.
///
/// Implementations must be [`Send`] and [`Sync`]: one source is shared by
/// all signing workers, and each worker opens its own session.
pub trait FrameSource: Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Prepare `path` for sampling.
    ///
    /// # Errors
    ///
    /// Any error means this tier cannot read the file at all; the builder
    /// moves on to the next tier.
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSession>, DedupError>;
}

/// A file opened by a [`FrameSource`].
pub trait FrameSession {
    /// Duration in seconds, or `None` if unknown or zero.
    fn duration(&self) -> Option<f64>;

    /// Decode the frame at `seconds` as an RGB image.
    ///
    /// # Errors
    ///
    /// Returns [`DedupError::DecodeFailure`] when that timestamp cannot be
    /// read, or [`DedupError::ExternalToolMissing`] when the tier's program
    /// is not installed.
    fn extract(&mut self, seconds: f64) -> Result<DynamicImage, DedupError>;
}

/// Primary tier: in-process FFmpeg decoding.
///
/// Opening a file also decodes its very first frame; a file whose first
/// frame cannot be read is handed to the next tier straight away.
#[derive(Debug, Clone, Copy, Default)]
pub struct InProcessSource;

struct InProcessSession {
    media: MediaFile,
}

impl FrameSource for InProcessSource {
    fn name(&self) -> &'static str {
        "in-process"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn FrameSession>, DedupError> {
        let mut media = MediaFile::open(path)?;
        media.frame_at(0.0).map_err(|error| DedupError::DecodeFailure {
            path: path.to_path_buf(),
            timestamp: 0.0,
            reason: format!("first frame unreadable: {error}"),
        })?;
        Ok(Box::new(InProcessSession { media }))
    }
}

impl FrameSession for InProcessSession {
    fn duration(&self) -> Option<f64> {
        self.media.metadata().duration_seconds()
    }

    fn extract(&mut self, seconds: f64) -> Result<DynamicImage, DedupError> {
        match self.media.frame_at(seconds) {
            Ok(frame) => Ok(DynamicImage::ImageRgb8(frame)),
            Err(error @ DedupError::DecodeFailure { .. }) => Err(error),
            Err(error) => Err(DedupError::DecodeFailure {
                path: self.media.path().to_path_buf(),
                timestamp: seconds,
                reason: error.to_string(),
            }),
        }
    }
}

/// Fallback tier: one `ffmpeg` process per timestamp.
///
/// The duration comes from `ffprobe`; if probing fails the session samples
/// only `t = 0`.
#[derive(Debug, Clone)]
pub struct ExternalSource {
    ffmpeg_program: PathBuf,
    frame_timeout: Duration,
    probe: FfprobeProbe,
}

struct ExternalSession {
    ffmpeg_program: PathBuf,
    frame_timeout: Duration,
    path: PathBuf,
    duration: Option<f64>,
}

impl ExternalSource {
    pub fn new<P, Q>(
        ffmpeg_program: P,
        ffprobe_program: Q,
        frame_timeout: Duration,
        probe_timeout: Duration,
    ) -> Self
    where
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
    {
        Self {
            ffmpeg_program: ffmpeg_program.into(),
            frame_timeout,
            probe: FfprobeProbe::new(ffprobe_program, probe_timeout),
        }
    }
}

impl FrameSource for ExternalSource {
    fn name(&self) -> &'static str {
        "external"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn FrameSession>, DedupError> {
        let duration = match self.probe.probe(path) {
            Ok(metadata) => metadata.duration_seconds(),
            Err(error) => {
                log::debug!("{}: duration unavailable ({error})", path.display());
                None
            }
        };
        Ok(Box::new(ExternalSession {
            ffmpeg_program: self.ffmpeg_program.clone(),
            frame_timeout: self.frame_timeout,
            path: path.to_path_buf(),
            duration,
        }))
    }
}

impl ExternalSession {
    fn failure(&self, seconds: f64, reason: String) -> DedupError {
        DedupError::DecodeFailure {
            path: self.path.clone(),
            timestamp: seconds,
            reason,
        }
    }
}

impl FrameSession for ExternalSession {
    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn extract(&mut self, seconds: f64) -> Result<DynamicImage, DedupError> {
        let timestamp = format!("{:.3}", seconds.max(0.0));
        let arguments = [
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-ss"),
            OsStr::new(&timestamp),
            OsStr::new("-i"),
            self.path.as_os_str(),
            OsStr::new("-frames:v"),
            OsStr::new("1"),
            OsStr::new("-f"),
            OsStr::new("image2pipe"),
            OsStr::new("-vcodec"),
            OsStr::new("png"),
            OsStr::new("-"),
        ];

        let output = match external::run_captured(&self.ffmpeg_program, arguments, self.frame_timeout)
        {
            Ok(output) => output,
            Err(error @ DedupError::ExternalToolMissing { .. }) => return Err(error),
            Err(error) => return Err(self.failure(seconds, error.to_string())),
        };

        if !output.status.success() {
            return Err(self.failure(seconds, format!("ffmpeg exited with {}", output.status)));
        }
        if output.stdout.is_empty() {
            return Err(self.failure(seconds, "ffmpeg emitted no image".to_string()));
        }

        let image = image::load_from_memory(&output.stdout)
            .map_err(|error| self.failure(seconds, format!("unreadable still: {error}")))?;
        Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
    }
}
