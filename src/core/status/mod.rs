//! # Status Module
//!
//! Triage flagging and its notification channel.
//!
//! - `StatusEventBus` - single-threaded fan-out of `(id, status)` events
//! - `StatusManager` - the one write path for statuses; every successful
//!   flag is published on the bus

mod bus;
mod manager;

pub use bus::{StatusEventBus, StatusSubscription};
pub use manager::StatusManager;

use crate::core::library::{MediaId, MediaStatus};
use serde::{Deserialize, Serialize};

/// A status change that has been written to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub id: MediaId,
    pub status: MediaStatus,
}
