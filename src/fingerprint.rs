use image::DynamicImage;
use image_hasher::{HashAlg, Hasher, HasherConfig};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::frames::SampledFrame;

/// 64-bit perceptual fingerprint of one still image. Opaque except for
/// `distance`; two fingerprints from visually similar frames land close
/// together in Hamming space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    /// Hamming distance; 0 for identical fingerprints, up to 64.
    pub fn distance(self, other: Fingerprint) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// One sampled frame's fingerprint, still tagged with its sample position.
#[derive(Debug, Clone, Copy)]
pub struct FrameFingerprint {
    pub ordinal: usize,
    pub fingerprint: Fingerprint,
}

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("hasher produced a {0}-byte hash, expected 8")]
    UnexpectedWidth(usize),
}

/// Perceptual hasher for sampled frames, configured for a 64-bit mean hash.
pub struct FrameHasher {
    hasher: Hasher,
}

impl FrameHasher {
    pub fn new() -> Self {
        let hasher = HasherConfig::new()
            .hash_alg(HashAlg::Mean)
            .hash_size(8, 8)
            .to_hasher();
        Self { hasher }
    }

    pub fn fingerprint(&self, image: &DynamicImage) -> Result<Fingerprint, FingerprintError> {
        let hash = self.hasher.hash_image(image);
        let bytes: [u8; 8] = hash
            .as_bytes()
            .try_into()
            .map_err(|_| FingerprintError::UnexpectedWidth(hash.as_bytes().len()))?;
        Ok(Fingerprint(u64::from_be_bytes(bytes)))
    }

    /// Fingerprint a file's frames in parallel, preserving sample order.
    /// Frames that cannot be hashed are dropped and shrink the sample count.
    pub fn fingerprint_frames(&self, file: &Path, frames: &[SampledFrame]) -> Vec<FrameFingerprint> {
        frames
            .par_iter()
            .filter_map(|frame| match self.fingerprint(&frame.image) {
                Ok(fingerprint) => Some(FrameFingerprint {
                    ordinal: frame.ordinal,
                    fingerprint,
                }),
                Err(err) => {
                    log::warn!(
                        "skipping frame {} of {}: {err}",
                        frame.ordinal,
                        file.display()
                    );
                    None
                }
            })
            .collect()
    }
}

impl Default for FrameHasher {
    fn default() -> Self {
        Self::new()
    }
}
