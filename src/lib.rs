//! # vdedup
//!
//! Find near-duplicate videos: files with the same visual content that may
//! differ in encoding, resolution, or container.
//!
//! Each file is reduced to a compact [`Signature`]: its duration, its
//! resolution, and a perceptual hash of a few frames sampled at evenly spaced
//! timestamps. Files of similar duration are compared by mean Hamming
//! distance between their hashes; files close enough form a cluster. Exactly
//! one file per cluster is kept (highest resolution, then largest size),
//! and every other member becomes a keep/drop [`Decision`].
//!
//! Frames are decoded in-process through
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next). If that fails for a
//! file, the external `ffmpeg`/`ffprobe` tools are tried, and as a last resort
//! a minimal signature is built from container metadata and a hash of the
//! file's first bytes. Files for which nothing works are reported as bad
//! files and never clustered.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vdedup::{DetectionOptions, DuplicateDetector};
//!
//! let options = DetectionOptions::new()
//!     .with_sample_count(8)
//!     .with_hash_threshold(8.0);
//! let detector = DuplicateDetector::new(options)?;
//! let report = detector.find_duplicates_in("videos", true)?;
//!
//! for path in &report.bad_files {
//!     println!("SKIP: {}", path.display());
//! }
//! for decision in &report.decisions {
//!     println!("KEEP: {}", decision.keep.display());
//!     println!("DEL : {}", decision.drop.display());
//! }
//! # Ok::<(), vdedup::DedupError>(())
//! ```
//!
//! Detection itself never modifies the filesystem. See [`execution`] for the
//! dry-run report, deletion, and move-to-quarantine.
//!
//! ### Single Signatures
//!
//! ```no_run
//! use std::path::Path;
//!
//! use vdedup::SignatureBuilder;
//!
//! let builder = SignatureBuilder::from_options(&Default::default());
//! let a = builder.build(Path::new("a.mp4"))?;
//! let b = builder.build(Path::new("b.mkv"))?;
//! println!("distance: {:.2}", a.distance(&b));
//! # Ok::<(), vdedup::DedupError>(())
//! ```
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | (default) sign files in parallel on a rayon pool |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed to build. The `ffmpeg` and
//! `ffprobe` executables are optional at run time; without them the external
//! fallback tier and the validation gate are skipped.

pub mod builder;
pub mod cluster;
pub mod configuration;
pub mod decision;
pub mod detector;
pub mod error;
pub mod execution;
mod external;
pub mod extractor;
pub mod ffmpeg;
pub mod hash;
pub mod keeper;
pub mod media;
pub mod metadata;
pub mod probe;
pub mod progress;
pub mod scan;
pub mod signature;
mod utilities;
pub mod validation;

pub use builder::SignatureBuilder;
pub use cluster::{Cluster, find_clusters};
pub use configuration::DetectionOptions;
pub use decision::{Decision, DetectionReport};
pub use detector::DuplicateDetector;
pub use error::DedupError;
pub use execution::{ExecutionMode, ExecutionSummary};
pub use extractor::{ExternalSource, FrameSession, FrameSource, InProcessSource};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use hash::{FrameHash, PerceptualHasher};
pub use keeper::{KeeperCandidate, Selection, select_keeper};
pub use media::MediaFile;
pub use metadata::{MediaMetadata, Resolution};
pub use probe::{FfprobeProbe, MediaProbe, MetadataProbe};
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use scan::collect_video_files;
pub use signature::{Fidelity, Signature, sample_timestamps};
pub use validation::{ValidationReport, validate_metadata};
