//! Fixed-width perceptual hashes.
//!
//! [`FrameHash`] is the single hash value type of the crate: 64 bits,
//! compared with [`FrameHash::distance`] (XOR + popcount). Frame hashes come
//! from [`PerceptualHasher`] (a DCT-based pHash of an 8×8 grid); the
//! substitute hash of a minimal signature comes from
//! [`FrameHash::from_content_prefix`]. Both are compared the same way.

use std::fmt::{Display, Formatter, LowerHex, Result as FmtResult};

use image::DynamicImage;
use image_hasher::{HashAlg, Hasher, HasherConfig};
use serde::{Serialize, Serializer};

/// Side length of the hash grid; 8×8 gives 64 bits.
const HASH_GRID: u32 = 8;

/// A 64-bit perceptual hash value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FrameHash(u64);

impl FrameHash {
    /// Number of bits in every hash.
    pub const BITS: u32 = u64::BITS;

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u64 {
        self.0
    }

    /// Hamming distance: the number of differing bits.
    pub const fn distance(&self, other: &FrameHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// Build a hash from raw hash bytes, big-endian. Bytes beyond the eighth
    /// are ignored; fewer than eight are zero-padded on the right.
    pub fn from_hash_bytes(bytes: &[u8]) -> Self {
        let mut word = [0u8; 8];
        for (slot, byte) in word.iter_mut().zip(bytes) {
            *slot = *byte;
        }
        Self(u64::from_be_bytes(word))
    }

    /// Substitute hash for files whose pictures cannot be decoded: the first
    /// 64 bits of the BLAKE3 digest of `prefix`.
    ///
    /// Only byte-identical prefixes are close under this hash; unrelated
    /// content lands around 32 bits apart, far beyond any sane threshold.
    pub fn from_content_prefix(prefix: &[u8]) -> Self {
        Self::from_hash_bytes(blake3::hash(prefix).as_bytes())
    }
}

impl Display for FrameHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{:016x}", self.0)
    }
}

impl LowerHex for FrameHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        LowerHex::fmt(&self.0, f)
    }
}

impl Serialize for FrameHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// DCT perceptual hasher for decoded frames.
///
/// Bits are set where a low-frequency DCT coefficient reaches the median of
/// the 64 kept coefficients, as in the classic pHash.
///
/// Holds precomputed DCT tables, so build one per file and reuse it for all
/// of that file's samples.
pub struct PerceptualHasher {
    hasher: Hasher,
}

impl PerceptualHasher {
    pub fn new() -> Self {
        let hasher = HasherConfig::new()
            .hash_alg(HashAlg::Median)
            .hash_size(HASH_GRID, HASH_GRID)
            .preproc_dct()
            .to_hasher();
        Self { hasher }
    }

    /// Hash a decoded frame.
    pub fn hash_image(&self, image: &DynamicImage) -> FrameHash {
        FrameHash::from_hash_bytes(self.hasher.hash_image(image).as_bytes())
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new()
    }
}
