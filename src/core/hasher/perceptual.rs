//! Perceptual Hash (pHash) implementation.
//!
//! pHash runs a Discrete Cosine Transform over a downscaled grayscale
//! copy and keeps the low-frequency signs, which makes it robust to:
//! - Scaling
//! - Brightness/contrast changes
//! - Compression artifacts
//!
//! We use the image_hasher crate's mean hash with DCT preprocessing.

use super::traits::ImageHash;
use image::DynamicImage;
use image_hasher::{HashAlg, Hasher, HasherConfig};

/// Computes the 64-bit fingerprint stored with every imported item
pub struct PerceptualHasher {
    hasher: Hasher,
}

impl PerceptualHasher {
    /// Create a new 8x8 (64-bit) pHash hasher
    pub fn new() -> Self {
        let hasher = HasherConfig::new()
            .hash_size(8, 8)
            .hash_alg(HashAlg::Mean)
            .preproc_dct()
            .to_hasher();

        Self { hasher }
    }

    /// Hash a decoded image
    pub fn hash_image(&self, image: &DynamicImage) -> ImageHash {
        let hash = self.hasher.hash_image(image);
        ImageHash::from_bytes(hash.as_bytes())
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new()
    }
}
