//! Lightweight media file probing.
//!
//! A [`MetadataProbe`] learns a file's duration and video dimensions without
//! decoding any picture. Two implementations are provided:
//!
//! - [`MediaProbe`] opens the file in-process with FFmpeg's demuxer and
//!   closes it again immediately.
//! - [`FfprobeProbe`] runs the external `ffprobe` program with a deadline and
//!   parses its JSON output. Missing or malformed fields default to a zero
//!   duration and an unknown resolution.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::error::DedupError;
use crate::external;
use crate::media::MediaFile;
use crate::metadata::{MediaMetadata, Resolution, seconds_to_duration};

/// Something that can report container metadata for a file.
///
/// Implementations must be [`Send`] and [`Sync`]: one probe instance is
/// shared by all signing workers.
pub trait MetadataProbe: Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Probe `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DedupError::ProbeFailure`] (or
    /// [`DedupError::ExternalToolMissing`] / [`DedupError::ExternalToolTimeout`]
    /// for external probes) when no metadata could be obtained.
    fn probe(&self, path: &Path) -> Result<MediaMetadata, DedupError>;
}

/// In-process probe backed by [`MediaFile`].
///
/// # Example
///
/// ```no_run
/// use vdedup::MediaProbe;
///
/// let metadata = MediaProbe::probe("input.mp4")?;
/// println!("{:?} at {}", metadata.duration, metadata.resolution);
/// # Ok::<(), vdedup::DedupError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaProbe;

impl MediaProbe {
    /// Probe a media file and return its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`DedupError::FileOpen`] or [`DedupError::NoVideoStream`] if
    /// the file cannot be opened as video.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<MediaMetadata, DedupError> {
        let media = MediaFile::open(path)?;
        Ok(media.metadata().clone())
    }

    /// Probe multiple media files. Failures produce an `Err` entry instead
    /// of aborting the batch.
    pub fn probe_many<P: AsRef<Path>>(paths: &[P]) -> Vec<Result<MediaMetadata, DedupError>> {
        paths.iter().map(|path| Self::probe(path)).collect()
    }
}

impl MetadataProbe for MediaProbe {
    fn name(&self) -> &'static str {
        "in-process"
    }

    fn probe(&self, path: &Path) -> Result<MediaMetadata, DedupError> {
        MediaProbe::probe(path).map_err(|error| DedupError::ProbeFailure {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })
    }
}

/// External probe that runs `ffprobe` on the first video stream.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    program: PathBuf,
    timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    codec_type: Option<String>,
    #[serde(default)]
    codec_name: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    #[serde(default)]
    duration: Option<Value>,
    #[serde(default)]
    format_name: Option<String>,
}

impl FfprobeProbe {
    pub fn new<P: Into<PathBuf>>(program: P, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Parse the JSON document printed by
    /// `ffprobe -show_entries stream=... -show_entries format=duration -of json`.
    ///
    /// Empty output is treated as an empty document. Missing fields default
    /// to a zero duration and a `0×0` resolution.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the output is not a JSON object.
    pub fn parse_output(stdout: &[u8]) -> Result<MediaMetadata, serde_json::Error> {
        let trimmed = stdout.trim_ascii();
        let output: FfprobeOutput = if trimmed.is_empty() {
            FfprobeOutput::default()
        } else {
            serde_json::from_slice(trimmed)?
        };

        let video = output
            .streams
            .iter()
            .find(|stream| stream.codec_type.as_deref().is_none_or(|kind| kind == "video"));

        let duration = output
            .format
            .as_ref()
            .and_then(|format| format.duration.as_ref())
            .and_then(parse_duration_value)
            .map(seconds_to_duration)
            .unwrap_or(Duration::ZERO);

        Ok(MediaMetadata {
            duration,
            resolution: video
                .map(|stream| {
                    Resolution::new(stream.width.unwrap_or(0), stream.height.unwrap_or(0))
                })
                .unwrap_or(Resolution::UNKNOWN),
            has_video: video.is_some(),
            frames_per_second: 0.0,
            frame_count: 0,
            codec: video.and_then(|stream| stream.codec_name.clone()),
            format: output.format.and_then(|format| format.format_name),
        })
    }
}

impl MetadataProbe for FfprobeProbe {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    fn probe(&self, path: &Path) -> Result<MediaMetadata, DedupError> {
        let arguments = [
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-select_streams"),
            OsStr::new("v:0"),
            OsStr::new("-show_entries"),
            OsStr::new("stream=codec_type,codec_name,width,height"),
            OsStr::new("-show_entries"),
            OsStr::new("format=duration,format_name"),
            OsStr::new("-of"),
            OsStr::new("json"),
            path.as_os_str(),
        ];
        let output = external::run_captured(&self.program, arguments, self.timeout)?;

        if !output.status.success() {
            return Err(DedupError::ProbeFailure {
                path: path.to_path_buf(),
                reason: format!("ffprobe exited with {}", output.status),
            });
        }

        Self::parse_output(&output.stdout).map_err(|error| DedupError::ProbeFailure {
            path: path.to_path_buf(),
            reason: format!("unreadable ffprobe output: {error}"),
        })
    }
}

/// `ffprobe` prints durations as strings (`"12.345000"`, sometimes `"N/A"`).
fn parse_duration_value(value: &Value) -> Option<f64> {
    let seconds = match value {
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        Value::Number(number) => number.as_f64()?,
        _ => return None,
    };
    (seconds.is_finite() && seconds >= 0.0).then_some(seconds)
}
