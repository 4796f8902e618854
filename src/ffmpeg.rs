//! FFmpeg initialisation and log level configuration.
//!
//! FFmpeg has its own internal logging system, separate from the Rust
//! [`log`](https://crates.io/crates/log) crate. Corrupt or partially broken
//! files make FFmpeg print a stream of decoder warnings to stderr, which is
//! noise for a duplicate scan that expects some files to be broken.
//! [`initialize`] performs the process-wide setup once and lowers FFmpeg's
//! verbosity to errors; later calls are no-ops.
//!
//! # Example
//!
//! ```no_run
//! use vdedup::FfmpegLogLevel;
//!
//! // Silence FFmpeg completely before scanning.
//! vdedup::set_ffmpeg_log_level(FfmpegLogLevel::Quiet);
//! ```

use std::sync::OnceLock;

use ffmpeg_next::util::log::Level;

use crate::error::DedupError;

static INITIALIZED: OnceLock<Result<(), String>> = OnceLock::new();
static LEVEL_CHOSEN: OnceLock<()> = OnceLock::new();

/// FFmpeg internal log verbosity level.
///
/// Maps directly to FFmpeg's `AV_LOG_*` constants.
///
/// # Ordering (most verbose → most quiet)
///
/// `Trace` > `Debug` > `Verbose` > `Info` > `Warning` > `Error` > `Fatal` > `Panic` > `Quiet`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Print no output at all.
    Quiet,
    /// Only log unrecoverable conditions that abort the process.
    Panic,
    /// Only log unrecoverable errors.
    Fatal,
    /// Log recoverable errors. This is what [`initialize`] selects.
    Error,
    /// Log warnings (FFmpeg's own default).
    Warning,
    /// Log informational messages.
    Info,
    /// Log verbose informational messages.
    Verbose,
    /// Log debugging messages.
    Debug,
    /// Extremely verbose tracing output.
    Trace,
}

impl FfmpegLogLevel {
    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Panic => Level::Panic,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
            FfmpegLogLevel::Trace => Level::Trace,
        }
    }

    /// Parse a level name as accepted by the CLI (`quiet`, `error`, `warning`, ...).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" => Some(FfmpegLogLevel::Quiet),
            "panic" => Some(FfmpegLogLevel::Panic),
            "fatal" => Some(FfmpegLogLevel::Fatal),
            "error" => Some(FfmpegLogLevel::Error),
            "warning" | "warn" => Some(FfmpegLogLevel::Warning),
            "info" => Some(FfmpegLogLevel::Info),
            "verbose" => Some(FfmpegLogLevel::Verbose),
            "debug" => Some(FfmpegLogLevel::Debug),
            "trace" => Some(FfmpegLogLevel::Trace),
            _ => None,
        }
    }
}

/// Set the FFmpeg internal log verbosity level.
///
/// This controls what FFmpeg prints to stderr. It does **not** affect
/// Rust-side `log` crate output. A level set here is kept by [`initialize`].
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    let _ = LEVEL_CHOSEN.set(());
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

/// Initialise FFmpeg once for the whole process.
///
/// Safe to call from any thread, any number of times. The first call
/// registers FFmpeg and, unless [`set_ffmpeg_log_level`] was called earlier,
/// lowers FFmpeg's verbosity to [`FfmpegLogLevel::Error`].
///
/// # Errors
///
/// Returns [`DedupError::FfmpegError`] if FFmpeg failed to initialise. The
/// failure is remembered and returned on every later call.
pub fn initialize() -> Result<(), DedupError> {
    INITIALIZED
        .get_or_init(|| {
            ffmpeg_next::init().map_err(|error| error.to_string())?;
            if LEVEL_CHOSEN.get().is_none() {
                ffmpeg_next::util::log::set_level(Level::Error);
            }
            log::debug!("FFmpeg initialised");
            Ok(())
        })
        .clone()
        .map_err(DedupError::FfmpegError)
}
