//! # Hasher Module
//!
//! Perceptual fingerprints used to cluster near-duplicate items.
//!
//! ## How It Works
//! 1. Downscale and convert to grayscale
//! 2. Run a DCT and keep the 8x8 low-frequency block
//! 3. Set one bit per coefficient above the mean
//! 4. Compare fingerprints using Hamming distance
//!
//! Hashes are computed once at import time and stored with the item;
//! browsing only ever compares stored values.

mod perceptual;
mod traits;

pub use perceptual::PerceptualHasher;
pub use traits::{ImageHash, PerceptualHash};
