//! Signature construction.
//!
//! [`SignatureBuilder`] runs an ordered chain of tiers over one file and
//! stops at the first that produces a usable signature:
//!
//! 1. each [`FrameSource`] in turn (in-process decoding, then the external
//!    `ffmpeg` process): sample evenly spaced timestamps and hash every frame
//!    that decodes. The tier is accepted when it produced at least one hash
//!    and no more than `max_fail_ratio` of its samples failed;
//! 2. if no tier was accepted but some produced hashes, the partial result
//!    with the most hashes (earliest tier on ties);
//! 3. a minimal signature, only when no tier decoded a single frame: probe
//!    metadata with each [`MetadataProbe`] in turn and hash the first bytes
//!    of the file in place of frames.
//!
//! When every tier fails the file is unsignable and
//! [`DedupError::SignatureUnavailable`] is returned.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use vdedup::{DetectionOptions, SignatureBuilder};
//!
//! let builder = SignatureBuilder::from_options(&DetectionOptions::default());
//! let signature = builder.build(Path::new("input.mp4"))?;
//! println!("{:.1}s, {} hashes", signature.duration(), signature.hashes().len());
//! # Ok::<(), vdedup::DedupError>(())
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::configuration::{DEFAULT_CONTENT_PREFIX_BYTES, DEFAULT_MAX_FAIL_RATIO, DetectionOptions};
use crate::error::DedupError;
use crate::extractor::{ExternalSource, FrameSource, InProcessSource};
use crate::hash::{FrameHash, PerceptualHasher};
use crate::metadata::Resolution;
use crate::probe::{FfprobeProbe, MediaProbe, MetadataProbe};
use crate::signature::{Signature, sample_timestamps};

/// Ordered chain of decode tiers plus the minimal-signature probes.
pub struct SignatureBuilder {
    sources: Vec<Box<dyn FrameSource>>,
    probes: Vec<Box<dyn MetadataProbe>>,
    sample_count: usize,
    max_fail_ratio: f64,
    content_prefix_bytes: usize,
}

/// What one frame tier produced for a file.
struct TierOutcome {
    signature: Signature,
    within_fail_ratio: bool,
}

impl SignatureBuilder {
    /// An empty chain sampling `sample_count` frames per file.
    ///
    /// Add tiers with [`with_source`](Self::with_source) and
    /// [`with_probe`](Self::with_probe).
    pub fn new(sample_count: usize) -> Self {
        Self {
            sources: Vec::new(),
            probes: Vec::new(),
            sample_count,
            max_fail_ratio: DEFAULT_MAX_FAIL_RATIO,
            content_prefix_bytes: DEFAULT_CONTENT_PREFIX_BYTES,
        }
    }

    /// The standard chain: in-process decoding, external `ffmpeg`, then a
    /// minimal signature from the in-process probe or `ffprobe`.
    pub fn from_options(options: &DetectionOptions) -> Self {
        Self::new(options.sample_count)
            .with_max_fail_ratio(options.max_fail_ratio)
            .with_content_prefix_bytes(options.content_prefix_bytes)
            .with_source(Box::new(InProcessSource))
            .with_source(Box::new(ExternalSource::new(
                options.ffmpeg_program.clone(),
                options.ffprobe_program.clone(),
                options.frame_timeout,
                options.probe_timeout,
            )))
            .with_probe(Box::new(MediaProbe))
            .with_probe(Box::new(FfprobeProbe::new(
                options.ffprobe_program.clone(),
                options.probe_timeout,
            )))
    }

    /// Append a frame-sampling tier.
    pub fn with_source(mut self, source: Box<dyn FrameSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Append a metadata probe used for minimal signatures.
    pub fn with_probe(mut self, probe: Box<dyn MetadataProbe>) -> Self {
        self.probes.push(probe);
        self
    }

    pub fn with_max_fail_ratio(mut self, ratio: f64) -> Self {
        self.max_fail_ratio = ratio;
        self
    }

    pub fn with_content_prefix_bytes(mut self, bytes: usize) -> Self {
        self.content_prefix_bytes = bytes;
        self
    }

    /// Build the signature of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DedupError::SignatureUnavailable`] when neither frame
    /// sampling nor metadata probing worked. No other error escapes.
    pub fn build(&self, path: &Path) -> Result<Signature, DedupError> {
        let hasher = PerceptualHasher::new();
        let mut partial: Option<Signature> = None;

        for source in &self.sources {
            let Some(outcome) = self.sample_with(source.as_ref(), path, &hasher) else {
                continue;
            };
            if outcome.within_fail_ratio {
                return Ok(outcome.signature);
            }
            let better = partial
                .as_ref()
                .is_none_or(|best| outcome.signature.hashes().len() > best.hashes().len());
            if better {
                partial = Some(outcome.signature);
            }
        }

        if let Some(signature) = partial {
            log::debug!(
                "{}: keeping partial signature with {} hashes",
                path.display(),
                signature.hashes().len()
            );
            return Ok(signature);
        }

        if let Some(signature) = self.minimal(path) {
            log::info!(
                "{}: no decodable frames, using minimal signature",
                path.display()
            );
            return Ok(signature);
        }

        Err(DedupError::SignatureUnavailable {
            path: path.to_path_buf(),
        })
    }

    fn sample_with(
        &self,
        source: &dyn FrameSource,
        path: &Path,
        hasher: &PerceptualHasher,
    ) -> Option<TierOutcome> {
        let mut session = match source.open(path) {
            Ok(session) => session,
            Err(error) => {
                log::debug!("{}: {} tier unavailable: {error}", path.display(), source.name());
                return None;
            }
        };

        let duration = session.duration();
        let timestamps = sample_timestamps(duration, self.sample_count);
        let mut hashes = Vec::with_capacity(timestamps.len());
        let mut resolution: Option<Resolution> = None;
        let mut failed = 0usize;

        for &timestamp in &timestamps {
            match session.extract(timestamp) {
                Ok(frame) => {
                    resolution.get_or_insert(Resolution::new(frame.width(), frame.height()));
                    hashes.push(hasher.hash_image(&frame));
                }
                Err(error @ DedupError::ExternalToolMissing { .. }) => {
                    log::warn!("{error}; skipping the {} tier", source.name());
                    return None;
                }
                Err(error) => {
                    log::debug!("{error}");
                    failed += 1;
                }
            }
        }

        if hashes.is_empty() {
            log::debug!("{}: {} tier decoded no frames", path.display(), source.name());
            return None;
        }

        let fail_ratio = failed as f64 / timestamps.len().max(1) as f64;
        let within_fail_ratio = fail_ratio <= self.max_fail_ratio;
        if !within_fail_ratio {
            log::debug!(
                "{}: {} tier failed {failed}/{} samples",
                path.display(),
                source.name(),
                timestamps.len()
            );
        }

        Some(TierOutcome {
            signature: Signature::sampled(
                duration.unwrap_or(0.0),
                hashes,
                resolution.unwrap_or(Resolution::UNKNOWN),
            ),
            within_fail_ratio,
        })
    }

    fn minimal(&self, path: &Path) -> Option<Signature> {
        let metadata = self.probes.iter().find_map(|probe| match probe.probe(path) {
            Ok(metadata) => Some(metadata),
            Err(error) => {
                log::debug!("{}: {} probe failed: {error}", path.display(), probe.name());
                None
            }
        })?;

        let prefix = match read_prefix(path, self.content_prefix_bytes) {
            Ok(prefix) => prefix,
            Err(error) => {
                log::debug!("{}: cannot read content prefix: {error}", path.display());
                return None;
            }
        };

        Some(Signature::minimal(
            metadata.duration.as_secs_f64(),
            FrameHash::from_content_prefix(&prefix),
            metadata.resolution,
        ))
    }
}

fn read_prefix(path: &Path, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut prefix = Vec::with_capacity(limit);
    File::open(path)?
        .take(limit as u64)
        .read_to_end(&mut prefix)?;
    Ok(prefix)
}
