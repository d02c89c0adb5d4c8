//! Perceptual hashing for images.
//!
//! Computes a 64-bit pHash: the image is reduced to grayscale, downsampled,
//! passed through a DCT, and the low-frequency 8x8 block is thresholded at its
//! median. Hashes are only ever compared by Hamming distance.
//!
//! # Usage
//!
//! ```no_run
//! use visioncop_core::fingerprint::PerceptualHasher;
//!
//! let hasher = PerceptualHasher::default();
//! let hash1 = hasher.hash_bytes(&std::fs::read("a.jpg").unwrap()).unwrap();
//! let hash2 = hasher.hash_bytes(&std::fs::read("b.jpg").unwrap()).unwrap();
//! let distance = hash1.distance(&hash2);
//! ```

use std::fmt;

use image::DynamicImage;
use image_hasher::{HashAlg, Hasher, HasherConfig};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VisionError};
use crate::media::ImageHandle;

/// Fixed hash size in bytes (64 bits = 8 bytes).
pub const PERCEPTUAL_HASH_SIZE: usize = 8;

/// Hash size in bits.
pub const PERCEPTUAL_HASH_BITS: u32 = (PERCEPTUAL_HASH_SIZE * 8) as u32;

/// Side of the low-frequency DCT block kept by the hash (8x8 = 64 bits).
const HASH_SIDE: u32 = 8;

/// A 64-bit perceptual hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PerceptualHash([u8; PERCEPTUAL_HASH_SIZE]);

impl PerceptualHash {
    pub fn new(bytes: [u8; PERCEPTUAL_HASH_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PERCEPTUAL_HASH_SIZE] {
        &self.0
    }

    /// Number of differing bits between the two hashes.
    pub fn distance(&self, other: &Self) -> u32 {
        hamming_distance(self, other)
    }

    /// Get the hash as a hexadecimal string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for PerceptualHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Perceptual hasher with a prepared DCT context.
///
/// Construction precomputes the DCT tables, so build one and reuse it.
pub struct PerceptualHasher {
    hasher: Hasher,
}

impl PerceptualHasher {
    pub fn new() -> Self {
        let hasher = HasherConfig::new()
            .hash_size(HASH_SIDE, HASH_SIDE)
            .hash_alg(HashAlg::Median)
            .preproc_dct()
            .to_hasher();
        Self { hasher }
    }

    /// Compute the hash from raw image bytes.
    pub fn hash_bytes(&self, image_data: &[u8]) -> Result<PerceptualHash> {
        let image = image::load_from_memory(image_data)
            .map_err(|e| VisionError::decode("<bytes>", e))?;
        self.hash_image(&image)
    }

    /// Compute the hash of a loaded image.
    pub fn hash_handle(&self, image: &ImageHandle) -> Result<PerceptualHash> {
        self.hash_image(image.pixels())
    }

    /// Compute the hash from decoded pixels.
    pub fn hash_image(&self, image: &DynamicImage) -> Result<PerceptualHash> {
        let hash = self.hasher.hash_image(image);
        let bytes: [u8; PERCEPTUAL_HASH_SIZE] = hash.as_bytes().try_into().map_err(|_| {
            VisionError::InvalidInput(format!(
                "Hasher produced {} bytes, expected {}",
                hash.as_bytes().len(),
                PERCEPTUAL_HASH_SIZE
            ))
        })?;
        Ok(PerceptualHash(bytes))
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PerceptualHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerceptualHasher")
            .field("bits", &PERCEPTUAL_HASH_BITS)
            .finish()
    }
}

/// Compute a perceptual hash for a loaded image using default settings.
pub fn fingerprint(image: &ImageHandle) -> Result<PerceptualHash> {
    PerceptualHasher::new().hash_handle(image)
}

/// Hamming distance between two hashes (popcount of XOR).
pub fn hamming_distance(a: &PerceptualHash, b: &PerceptualHash) -> u32 {
    a.0.iter()
        .zip(b.0.iter())
        .map(|(x, y)| (x ^ y).count_ones())
        .sum()
}
