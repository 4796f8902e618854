//! Media metadata types.
//!
//! [`MediaMetadata`] is what a probe learns about a file without decoding
//! pictures: container duration and the dimensions of the best video stream.
//! Missing or malformed fields default to a zero duration and an unknown
//! [`Resolution`] of `0×0`.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

use serde::Serialize;

/// Frame dimensions in pixels. `0×0` means unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// The unknown resolution, `0×0`.
    pub const UNKNOWN: Resolution = Resolution {
        width: 0,
        height: 0,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Pixel count, `width * height`, widened so 8K sources cannot overflow.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// `true` when both dimensions are non-zero.
    pub fn is_known(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl Display for Resolution {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}×{}", self.width, self.height)
    }
}

/// Metadata for a media file, as reported by a probe.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct MediaMetadata {
    /// Total duration. Zero when the container does not report one.
    pub duration: Duration,
    /// Dimensions of the best video stream, if one was found.
    pub resolution: Resolution,
    /// `true` if the file carries at least one video stream.
    pub has_video: bool,
    /// Frames per second (approximate for variable-frame-rate content), or 0.
    pub frames_per_second: f64,
    /// Frame count as reported by the stream header, or 0 when unknown.
    pub frame_count: u64,
    /// Video codec name (e.g. `"h264"`), if known.
    pub codec: Option<String>,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`), if known.
    pub format: Option<String>,
}

impl MediaMetadata {
    /// Duration in seconds, or `None` when it is zero or unknown.
    pub fn duration_seconds(&self) -> Option<f64> {
        let seconds = self.duration.as_secs_f64();
        (seconds > 0.0).then_some(seconds)
    }
}

/// Convert a floating-point second count to a [`Duration`], mapping negative,
/// NaN, and infinite values to zero.
pub(crate) fn seconds_to_duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
}
