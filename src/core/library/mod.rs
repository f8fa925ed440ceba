//! # Library Module
//!
//! The media store: the ordered item repository every other component
//! reads through. Items are referenced everywhere else by [`MediaId`] only.
//!
//! ## Backends
//! - `SqliteStore` - Persistent library file (WAL mode, read-only fetch contexts)
//! - `InMemoryStore` - For tests and embedders without persistence

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{MediaStore, StoreReader};

use crate::core::hasher::ImageHash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Opaque, stable handle of a media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(i64);

impl MediaId {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MediaId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(MediaId)
    }
}

/// Triage status of an imported item
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MediaStatus {
    #[default]
    Unspecified,
    Accepted,
    Rejected,
}

impl MediaStatus {
    pub const ALL: [MediaStatus; 3] = [
        MediaStatus::Unspecified,
        MediaStatus::Accepted,
        MediaStatus::Rejected,
    ];

    /// Stable lowercase name, used for storage and the CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaStatus::Unspecified => "unspecified",
            MediaStatus::Accepted => "accepted",
            MediaStatus::Rejected => "rejected",
        }
    }

    /// Inverse of [`MediaStatus::as_str`]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "unspecified" => Some(MediaStatus::Unspecified),
            "accepted" => Some(MediaStatus::Accepted),
            "rejected" => Some(MediaStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload quality level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Fast, low-fidelity thumbnail
    Preview,
    /// Authoritative full-quality bytes
    Original,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Preview => write!(f, "preview"),
            Tier::Original => write!(f, "original"),
        }
    }
}

/// What kind of record an item is
///
/// Only imported items carry a triage status. Edited variants are
/// unclassifiable by status predicates and therefore always match them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Imported { status: MediaStatus },
    Edited { source: Option<MediaId> },
}

impl MediaKind {
    pub fn status(&self) -> Option<MediaStatus> {
        match self {
            MediaKind::Imported { status } => Some(*status),
            MediaKind::Edited { .. } => None,
        }
    }

    pub fn is_edited(&self) -> bool {
        matches!(self, MediaKind::Edited { .. })
    }
}

/// Pixel dimensions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One browsable image record, owned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: MediaId,
    pub kind: MediaKind,
    /// Capture time, or import time when unknown
    pub created_at: DateTime<Utc>,
    pub perceptual_hash: ImageHash,
    /// Size of the original payload in bytes
    pub file_size: u64,
    pub dimensions: Dimensions,
    pub original_filename: Option<String>,
    /// EXIF orientation (1-8, where 1 is upright)
    pub orientation: u16,
}

impl MediaItem {
    pub fn status(&self) -> Option<MediaStatus> {
        self.kind.status()
    }
}

/// A record about to be inserted, payloads included
#[derive(Debug, Clone)]
pub struct NewMediaItem {
    pub kind: MediaKind,
    pub created_at: DateTime<Utc>,
    pub perceptual_hash: ImageHash,
    pub file_size: u64,
    pub dimensions: Dimensions,
    pub original_filename: Option<String>,
    pub orientation: u16,
    pub original: Option<Vec<u8>>,
    pub preview: Option<Vec<u8>>,
}

impl NewMediaItem {
    /// Minimal imported record with the given payloads
    pub fn imported(
        created_at: DateTime<Utc>,
        perceptual_hash: ImageHash,
        original: Option<Vec<u8>>,
        preview: Option<Vec<u8>>,
    ) -> Self {
        Self {
            kind: MediaKind::Imported {
                status: MediaStatus::Unspecified,
            },
            created_at,
            perceptual_hash,
            file_size: original.as_ref().map(|d| d.len() as u64).unwrap_or(0),
            dimensions: Dimensions::default(),
            original_filename: None,
            orientation: 1,
            original,
            preview,
        }
    }

    pub fn with_status(mut self, status: MediaStatus) -> Self {
        self.kind = MediaKind::Imported { status };
        self
    }

    pub fn with_filename(mut self, name: impl Into<String>) -> Self {
        self.original_filename = Some(name.into());
        self
    }

    pub fn payload(&self, tier: Tier) -> Option<&Vec<u8>> {
        match tier {
            Tier::Preview => self.preview.as_ref(),
            Tier::Original => self.original.as_ref(),
        }
    }
}
