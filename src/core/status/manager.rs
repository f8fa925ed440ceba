//! The status write path.

use super::StatusEventBus;
use crate::core::library::{MediaId, MediaKind, MediaStatus, MediaStore};
use crate::error::StoreError;
use std::sync::Arc;
use tracing::debug;

/// Flags items and announces the change
pub struct StatusManager {
    store: Arc<dyn MediaStore>,
    bus: StatusEventBus,
}

impl StatusManager {
    pub fn new(store: Arc<dyn MediaStore>, bus: StatusEventBus) -> Self {
        Self { store, bus }
    }

    pub fn bus(&self) -> &StatusEventBus {
        &self.bus
    }

    /// Set the status of an imported item and publish it
    ///
    /// With `toggle`, flagging an item with the status it already has
    /// resets it to `Unspecified`. Returns the status written, or `None`
    /// when the id does not resolve to an imported item; nothing is
    /// published in that case. The change is pending until the store is
    /// saved.
    pub fn flag(
        &self,
        id: MediaId,
        status: MediaStatus,
        toggle: bool,
    ) -> Result<Option<MediaStatus>, StoreError> {
        let current = match self.store.by_id(id)? {
            Some(item) => match item.kind {
                MediaKind::Imported { status } => status,
                MediaKind::Edited { .. } => return Ok(None),
            },
            None => return Ok(None),
        };

        let new_status = if toggle && current == status {
            MediaStatus::Unspecified
        } else {
            status
        };

        self.store.set_status(id, new_status)?;
        debug!(%id, status = %new_status, "flagged item");
        self.bus.publish(id, new_status);

        Ok(Some(new_status))
    }
}
