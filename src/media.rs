//! In-process media access.
//!
//! [`MediaFile`] opens a file with FFmpeg's demuxer, caches the metadata of
//! its best video stream, and decodes single frames at arbitrary timestamps
//! as packed RGB images. It is the primary decode path; the external
//! `ffmpeg` process is only used when this path cannot read a file.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::{
    error::DedupError,
    metadata::{MediaMetadata, Resolution, seconds_to_duration},
    utilities,
};

/// Decoded frames whose timestamp is this close below the target still count.
const FRAME_TIME_EPSILON: f64 = 0.001;

/// An opened media file with a usable video stream.
///
/// Created via [`MediaFile::open`]. Every call to
/// [`frame_at`](MediaFile::frame_at) builds a fresh decoder, seeks to the
/// nearest keyframe before the target, and decodes forward.
///
/// # Example
///
/// ```no_run
/// use vdedup::MediaFile;
///
/// let mut media = MediaFile::open("input.mp4")?;
/// println!("duration: {:?}", media.metadata().duration);
/// let frame = media.frame_at(12.5)?;
/// println!("{}x{}", frame.width(), frame.height());
/// # Ok::<(), vdedup::DedupError>(())
/// ```
pub struct MediaFile {
    input_context: Input,
    video_stream_index: usize,
    metadata: MediaMetadata,
    file_path: PathBuf,
}

impl Debug for MediaFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaFile")
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl MediaFile {
    /// Open a media file and locate its best video stream.
    ///
    /// Initialises FFmpeg (idempotent) first.
    ///
    /// # Errors
    ///
    /// - [`DedupError::FileOpen`] if the demuxer or the video decoder cannot
    ///   be created.
    /// - [`DedupError::NoVideoStream`] if the file has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DedupError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening media file: {}", file_path.display());

        crate::ffmpeg::initialize()?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| DedupError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| DedupError::NoVideoStream(file_path.clone()))?;
        let video_stream_index = stream.index();

        let decoder_context =
            CodecContext::from_parameters(stream.parameters()).map_err(|error| {
                DedupError::FileOpen {
                    path: file_path.clone(),
                    reason: format!("Failed to read video codec parameters: {error}"),
                }
            })?;
        let video_decoder =
            decoder_context
                .decoder()
                .video()
                .map_err(|error| DedupError::FileOpen {
                    path: file_path.clone(),
                    reason: format!("Failed to create video decoder: {error}"),
                })?;

        let frames_per_second = match utilities::rational_to_fps(stream.avg_frame_rate()) {
            fps if fps > 0.0 => fps,
            _ => utilities::rational_to_fps(stream.rate()),
        };
        let frame_count = u64::try_from(stream.frames()).unwrap_or(0);

        // Frame count over frame rate when the header has both, container
        // duration otherwise.
        let container_microseconds = input_context.duration();
        let duration = if frame_count > 0 && frames_per_second > 0.0 {
            seconds_to_duration(frame_count as f64 / frames_per_second)
        } else if container_microseconds > 0 {
            Duration::from_micros(container_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let codec = video_decoder.codec().map(|codec| codec.name().to_string());

        let metadata = MediaMetadata {
            duration,
            resolution: Resolution::new(video_decoder.width(), video_decoder.height()),
            has_video: true,
            frames_per_second,
            frame_count,
            codec,
            format: Some(input_context.format().name().to_string()),
        };

        Ok(Self {
            input_context,
            video_stream_index,
            metadata,
            file_path,
        })
    }

    /// Metadata cached at open time.
    pub fn metadata(&self) -> &MediaMetadata {
        &self.metadata
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Decode the first frame shown at or after `seconds`.
    ///
    /// If the stream ends before reaching the target (a seek close to the end
    /// of a file whose duration is overstated), the last decoded frame is
    /// returned instead.
    ///
    /// # Errors
    ///
    /// Returns [`DedupError::DecodeFailure`] if seeking fails or no frame can
    /// be decoded, or an FFmpeg error if the decoder cannot be built.
    pub fn frame_at(&mut self, seconds: f64) -> Result<RgbImage, DedupError> {
        let stream = self
            .input_context
            .stream(self.video_stream_index)
            .ok_or_else(|| DedupError::NoVideoStream(self.file_path.clone()))?;
        let time_base = stream.time_base();
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let mut decoder = decoder_context.decoder().video()?;

        let target_timestamp = utilities::seconds_to_seek_timestamp(seconds);
        self.input_context
            .seek(target_timestamp, ..target_timestamp)
            .map_err(|error| {
                decode_failure(&self.file_path, seconds, format!("seek failed: {error}"))
            })?;

        let video_stream_index = self.video_stream_index;
        let file_path = &self.file_path;
        let mut decoded_frame = VideoFrame::empty();

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != video_stream_index {
                continue;
            }

            // A corrupt packet only costs us that packet.
            if decoder.send_packet(&packet).is_err() {
                continue;
            }

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                if reached_target(&decoded_frame, time_base, seconds) {
                    return convert_frame(&decoded_frame, file_path, seconds);
                }
            }
        }

        decoder.send_eof()?;
        let mut last_frame: Option<VideoFrame> = None;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            if reached_target(&decoded_frame, time_base, seconds) {
                return convert_frame(&decoded_frame, file_path, seconds);
            }
            last_frame = Some(decoded_frame.clone());
        }

        match last_frame {
            Some(frame) => convert_frame(&frame, file_path, seconds),
            None => Err(decode_failure(
                file_path,
                seconds,
                "no frame decoded".to_string(),
            )),
        }
    }
}

/// Scale a decoded frame of any pixel format to a packed RGB image.
fn convert_frame(
    decoded_frame: &VideoFrame,
    path: &Path,
    seconds: f64,
) -> Result<RgbImage, DedupError> {
    let width = decoded_frame.width();
    let height = decoded_frame.height();
    if width == 0 || height == 0 {
        return Err(decode_failure(
            path,
            seconds,
            "decoded an empty frame".to_string(),
        ));
    }

    let mut scaler = ScalingContext::get(
        decoded_frame.format(),
        width,
        height,
        Pixel::RGB24,
        width,
        height,
        ScalingFlags::BILINEAR,
    )?;
    let mut rgb_frame = VideoFrame::empty();
    scaler.run(decoded_frame, &mut rgb_frame)?;

    let buffer = utilities::frame_to_rgb_buffer(&rgb_frame, width, height);
    RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        decode_failure(
            path,
            seconds,
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })
}

fn decode_failure(path: &Path, seconds: f64, reason: String) -> DedupError {
    DedupError::DecodeFailure {
        path: path.to_path_buf(),
        timestamp: seconds,
        reason,
    }
}

fn reached_target(frame: &VideoFrame, time_base: ffmpeg_next::Rational, seconds: f64) -> bool {
    match frame.timestamp().or_else(|| frame.pts()) {
        Some(pts) => utilities::pts_to_seconds(pts, time_base) + FRAME_TIME_EPSILON >= seconds,
        None => true,
    }
}
