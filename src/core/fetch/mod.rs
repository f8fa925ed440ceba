//! # Fetch Module
//!
//! Asynchronous payload loading on a dedicated worker pool.
//!
//! ## Operations
//! - `fetch_payload` - raw bytes of one tier
//! - `fetch_decoded_image` - bytes decoded into a raster image
//! - `fetch_metadata` - EXIF metadata of the original
//! - `fetch_histogram` - per-channel histogram of one tier
//! - `fetch_opportunistic` / `fetch_opportunistic_image` - preview first,
//!   then the original, on one subscription
//!
//! Every request opens its own read-only store context on the worker and
//! releases it when the worker returns. Nothing is retried.

mod handle;
mod opportunistic;
mod pipeline;

pub use handle::FetchHandle;
pub use opportunistic::{Delivery, FetchState, OpportunisticFetch};
pub use pipeline::FetchPipeline;

use crate::core::library::Tier;
use image::DynamicImage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A decoded payload together with the bytes it came from
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub tier: Tier,
    pub image: DynamicImage,
    pub encoded: Vec<u8>,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Shared cancellation flag between a handle and its worker
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
