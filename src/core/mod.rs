//! # Core Module
//!
//! The presentation-agnostic browsing engine.
//!
//! ## Modules
//! - `library` - The media store and its backends
//! - `filter` - Predicates deciding what a view shows
//! - `browsing` - Filtered views and positional change-sets
//! - `status` - Triage flagging and status notifications
//! - `similar` - Groups runs of visually similar items
//! - `hasher` - Computes perceptual hashes
//! - `fetch` - Asynchronous preview/original loading
//! - `metadata` - Extracts EXIF metadata
//! - `import` - Bulk and edited-variant import
//! - `scanner` - Discovers image files on disk

pub mod browsing;
pub mod fetch;
pub mod filter;
pub mod hasher;
pub mod import;
pub mod library;
pub mod metadata;
pub mod scanner;
pub mod similar;
pub mod status;

// Re-export commonly used types
pub use browsing::{BrowsingView, ChangeSet, ChangeSetEntry};
pub use fetch::{FetchPipeline, FetchState};
pub use filter::{FilterSet, StatusFilter};
pub use library::{MediaId, MediaItem, MediaStatus, MediaStore, Tier};
pub use similar::{ListEntry, SimilarityGrouper};
pub use status::{StatusEventBus, StatusManager};
