//! Media store trait definitions.

use super::{MediaId, MediaItem, MediaStatus, NewMediaItem, Tier};
use crate::core::hasher::ImageHash;
use crate::error::StoreError;

/// Read-only view of a store, derived for one fetch
///
/// Readers never write and never contend with the store's write path.
/// They are dropped as soon as the fetch that opened them finishes.
pub trait StoreReader: Send {
    /// Whether the id resolves against this reader's snapshot
    fn contains(&self, id: MediaId) -> Result<bool, StoreError>;

    /// Payload bytes of a tier, `None` if the tier holds no data
    fn payload(&self, id: MediaId, tier: Tier) -> Result<Option<Vec<u8>>, StoreError>;
}

/// Ordered item repository and single source of truth for ids,
/// statuses and payloads.
///
/// All mutations go through the one designated write path of an
/// implementation. Status changes must be made through
/// [`StatusManager`](crate::core::status::StatusManager) so the change is
/// published to observers.
pub trait MediaStore: Send + Sync {
    /// Every item, creation time ascending
    fn list(&self) -> Result<Vec<MediaItem>, StoreError>;

    /// Every id, creation time ascending
    fn ids(&self) -> Result<Vec<MediaId>, StoreError> {
        Ok(self.list()?.into_iter().map(|item| item.id).collect())
    }

    /// Look up a single item
    fn by_id(&self, id: MediaId) -> Result<Option<MediaItem>, StoreError>;

    /// Payload bytes of a tier, read through the primary context
    fn payload(&self, id: MediaId, tier: Tier) -> Result<Option<Vec<u8>>, StoreError>;

    /// Perceptual hash of an item
    fn perceptual_hash(&self, id: MediaId) -> Result<Option<ImageHash>, StoreError> {
        Ok(self.by_id(id)?.map(|item| item.perceptual_hash))
    }

    /// Overwrite the status of an imported item
    fn set_status(&self, id: MediaId, status: MediaStatus) -> Result<(), StoreError>;

    /// Store a new item and return its id
    fn insert(&self, item: NewMediaItem) -> Result<MediaId, StoreError>;

    /// Replace the content of an existing item, keeping its id
    fn replace(&self, id: MediaId, item: NewMediaItem) -> Result<(), StoreError>;

    /// The edited variant derived from `source`, if one exists
    fn edited_variant_of(&self, source: MediaId) -> Result<Option<MediaId>, StoreError>;

    /// Commit pending changes
    fn save(&self) -> Result<(), StoreError>;

    /// Open a read-only context for use off the caller's thread
    fn read_context(&self) -> Result<Box<dyn StoreReader>, StoreError>;
}
