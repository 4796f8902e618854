//! Per-file video signatures.
//!
//! A [`Signature`] summarises a file for comparison: its duration, the
//! resolution of its first decoded frame, and an ordered sequence of
//! [`FrameHash`] values sampled evenly across the file. A minimal signature
//! has the same shape with a single substitute hash; only its
//! [`Fidelity`] tells it apart.

use serde::Serialize;

use crate::hash::FrameHash;
use crate::metadata::Resolution;

/// How a signature's hashes were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fidelity {
    /// Hashes of decoded frames.
    Sampled,
    /// One hash of the file's leading bytes; pictures were undecodable.
    Minimal,
}

/// Immutable comparison summary of one video file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signature {
    duration: f64,
    hashes: Vec<FrameHash>,
    resolution: Resolution,
    fidelity: Fidelity,
}

impl Signature {
    /// A signature built from sampled frames.
    ///
    /// Negative or non-finite durations are recorded as `0.0`.
    pub fn sampled(duration: f64, hashes: Vec<FrameHash>, resolution: Resolution) -> Self {
        Self {
            duration: sanitize_duration(duration),
            hashes,
            resolution,
            fidelity: Fidelity::Sampled,
        }
    }

    /// A minimal signature: probed metadata plus one content hash.
    pub fn minimal(duration: f64, content_hash: FrameHash, resolution: Resolution) -> Self {
        Self {
            duration: sanitize_duration(duration),
            hashes: vec![content_hash],
            resolution,
            fidelity: Fidelity::Minimal,
        }
    }

    /// Duration in seconds, `0.0` when unknown.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn hashes(&self) -> &[FrameHash] {
        &self.hashes
    }

    /// Resolution, `0×0` when unknown.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn fidelity(&self) -> Fidelity {
        self.fidelity
    }

    /// Mean Hamming distance over index-aligned hashes.
    ///
    /// Hash sequences are compared position by position up to the shorter
    /// length. If either signature has no hashes the distance is infinite,
    /// so such a signature never matches anything.
    pub fn distance(&self, other: &Signature) -> f64 {
        let aligned = self.hashes.len().min(other.hashes.len());
        if aligned == 0 {
            return f64::INFINITY;
        }
        let total: u32 = self
            .hashes
            .iter()
            .zip(&other.hashes)
            .map(|(a, b)| a.distance(b))
            .sum();
        f64::from(total) / aligned as f64
    }
}

fn sanitize_duration(duration: f64) -> f64 {
    if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        0.0
    }
}

/// Timestamps (seconds) at which to sample a file.
///
/// `count` points evenly spaced strictly inside `(0, duration)`:
/// `duration * (i + 1) / (count + 1)`. The first and last instants are
/// skipped because they are often black or title frames. When the duration
/// is unknown or zero the only sample is `0.0`.
pub fn sample_timestamps(duration: Option<f64>, count: usize) -> Vec<f64> {
    match duration {
        Some(duration) if duration.is_finite() && duration > 0.0 && count > 0 => (0..count)
            .map(|i| duration * (i + 1) as f64 / (count + 1) as f64)
            .collect(),
        _ => vec![0.0],
    }
}
