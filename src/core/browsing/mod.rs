//! # Browsing Module
//!
//! Filtered projections of the library and the positional diffs that keep
//! a presentation layer in sync with them.
//!
//! ## Update model
//! - Filter passes produce a [`ChangeSet`] of removals and insertions.
//! - Status changes produce a single `Update` at the item's position and
//!   never change membership until the next filter pass.
//! - Exchanging the source list is a full reload.

mod changeset;
mod view;

pub use changeset::{ChangeSet, ChangeSetEntry};
pub use view::BrowsingView;
