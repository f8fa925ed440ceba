//! # Similar Module
//!
//! Clusters runs of visually similar items in a creation-ordered list.
//!
//! ## How It Works
//! 1. Walk the ids in order, keeping a current group
//! 2. An id joins the group if its hash is within the threshold of ANY
//!    member already in it
//! 3. Otherwise the group is closed and the id starts a new one
//!
//! The pass never revisits a closed group, so the result depends on
//! input order: a middle item can bridge two otherwise distant ones.

mod grouper;

pub use grouper::SimilarityGrouper;

use crate::core::hasher::ImageHash;
use crate::core::library::{MediaId, MediaStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// One entry of a grouped list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListEntry {
    /// An item with no similar neighbour
    Single(MediaId),
    /// Two or more consecutive similar items, in input order
    Group(Vec<MediaId>),
}

impl ListEntry {
    pub fn ids(&self) -> &[MediaId] {
        match self {
            ListEntry::Single(id) => std::slice::from_ref(id),
            ListEntry::Group(ids) => ids,
        }
    }

    pub fn len(&self) -> usize {
        self.ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ListEntry::Group(_))
    }
}

/// Resolves the perceptual hash of an item
pub trait HashSource {
    fn hash_of(&self, id: MediaId) -> Option<ImageHash>;
}

impl<S: MediaStore + ?Sized> HashSource for S {
    fn hash_of(&self, id: MediaId) -> Option<ImageHash> {
        match self.perceptual_hash(id) {
            Ok(hash) => hash,
            Err(e) => {
                warn!(%id, error = %e, "could not load perceptual hash");
                None
            }
        }
    }
}

impl HashSource for HashMap<MediaId, ImageHash> {
    fn hash_of(&self, id: MediaId) -> Option<ImageHash> {
        self.get(&id).copied()
    }
}
