//! Single-pass grouping of similar neighbours.

use super::{HashSource, ListEntry};
use crate::config::Config;
use crate::core::hasher::{ImageHash, PerceptualHash};
use crate::core::library::MediaId;
use tracing::debug;

/// Default distance below which two hashes count as similar
pub const DEFAULT_THRESHOLD: u32 = 20;

/// Groups consecutive similar items
#[derive(Debug, Clone, Copy)]
pub struct SimilarityGrouper {
    threshold: u32,
}

impl SimilarityGrouper {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.similarity_threshold)
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn is_similar(&self, a: &ImageHash, b: &ImageHash) -> bool {
        a.distance(b) < self.threshold
    }

    /// Group `ids` in one forward pass
    ///
    /// Ids without a resolvable hash are never similar to anything and
    /// always end up on their own.
    pub fn group<S: HashSource + ?Sized>(&self, ids: &[MediaId], source: &S) -> Vec<ListEntry> {
        let mut entries = Vec::new();
        let mut current: Vec<MediaId> = Vec::new();
        let mut hashes: Vec<ImageHash> = Vec::new();

        for &id in ids {
            let hash = source.hash_of(id);
            let joins = match hash {
                Some(hash) => hashes.iter().any(|member| self.is_similar(member, &hash)),
                None => false,
            };

            if !joins {
                flush(&mut entries, &mut current);
                hashes.clear();
            }
            current.push(id);
            // a hashless id has no similarity and stays alone
            hashes.extend(hash);
        }
        flush(&mut entries, &mut current);

        debug!(
            items = ids.len(),
            groups = entries.iter().filter(|e| e.is_group()).count(),
            "grouped similar items"
        );
        entries
    }
}

impl Default for SimilarityGrouper {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

fn flush(entries: &mut Vec<ListEntry>, current: &mut Vec<MediaId>) {
    match current.len() {
        0 => {}
        1 => entries.push(ListEntry::Single(current[0])),
        _ => entries.push(ListEntry::Group(std::mem::take(current))),
    }
    current.clear();
}
