//! In-memory store backend for testing.

use super::{
    MediaId, MediaItem, MediaKind, MediaStatus, MediaStore, NewMediaItem, StoreReader, Tier,
};
use crate::error::StoreError;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

struct StoredItem {
    item: MediaItem,
    original: Option<Vec<u8>>,
    preview: Option<Vec<u8>>,
}

impl StoredItem {
    fn payload(&self, tier: Tier) -> Option<Vec<u8>> {
        match tier {
            Tier::Preview => self.preview.clone(),
            Tier::Original => self.original.clone(),
        }
    }
}

#[derive(Default)]
struct MemoryState {
    items: BTreeMap<MediaId, StoredItem>,
    last_id: i64,
    saves: usize,
}

/// In-memory store backend
///
/// Writes are visible immediately; `save` only counts commits. Read
/// contexts share the same state through a read lock.
#[derive(Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls so far
    pub fn save_count(&self) -> usize {
        self.state.read().map(|s| s.saves).unwrap_or(0)
    }
}

fn build_item(id: MediaId, new: &NewMediaItem) -> MediaItem {
    MediaItem {
        id,
        kind: new.kind,
        created_at: new.created_at,
        perceptual_hash: new.perceptual_hash,
        file_size: new.file_size,
        dimensions: new.dimensions,
        original_filename: new.original_filename.clone(),
        orientation: new.orientation,
    }
}

impl MediaStore for InMemoryStore {
    fn list(&self) -> Result<Vec<MediaItem>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;

        let mut items: Vec<MediaItem> = state.items.values().map(|s| s.item.clone()).collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    fn by_id(&self, id: MediaId) -> Result<Option<MediaItem>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.items.get(&id).map(|s| s.item.clone()))
    }

    fn payload(&self, id: MediaId, tier: Tier) -> Result<Option<Vec<u8>>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.items.get(&id).and_then(|s| s.payload(tier)))
    }

    fn set_status(&self, id: MediaId, status: MediaStatus) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;

        match state.items.get_mut(&id) {
            Some(stored) if !stored.item.kind.is_edited() => {
                stored.item.kind = MediaKind::Imported { status };
                Ok(())
            }
            _ => Err(StoreError::ItemNotFound { id }),
        }
    }

    fn insert(&self, item: NewMediaItem) -> Result<MediaId, StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;

        state.last_id += 1;
        let id = MediaId::new(state.last_id);
        let stored = StoredItem {
            item: build_item(id, &item),
            original: item.original,
            preview: item.preview,
        };
        state.items.insert(id, stored);
        Ok(id)
    }

    fn replace(&self, id: MediaId, item: NewMediaItem) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;

        let stored = state
            .items
            .get_mut(&id)
            .ok_or(StoreError::ItemNotFound { id })?;
        stored.item = build_item(id, &item);
        stored.original = item.original;
        stored.preview = item.preview;
        Ok(())
    }

    fn edited_variant_of(&self, source: MediaId) -> Result<Option<MediaId>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;

        Ok(state
            .items
            .values()
            .find(|s| s.item.kind == MediaKind::Edited { source: Some(source) })
            .map(|s| s.item.id))
    }

    fn save(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        state.saves += 1;
        Ok(())
    }

    fn read_context(&self) -> Result<Box<dyn StoreReader>, StoreError> {
        Ok(Box::new(MemoryReader {
            state: Arc::clone(&self.state),
        }))
    }
}

/// Read-only handle onto an `InMemoryStore`
struct MemoryReader {
    state: Arc<RwLock<MemoryState>>,
}

impl StoreReader for MemoryReader {
    fn contains(&self, id: MediaId) -> Result<bool, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.items.contains_key(&id))
    }

    fn payload(&self, id: MediaId, tier: Tier) -> Result<Option<Vec<u8>>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.items.get(&id).and_then(|s| s.payload(tier)))
    }
}
