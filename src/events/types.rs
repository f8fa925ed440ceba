//! Event type definitions for progress and change reporting.

use crate::core::browsing::ChangeSet;
use crate::core::library::MediaId;
use serde::{Deserialize, Serialize};

/// Events carried on a background task's channel
///
/// Views publish `ViewEvent` to their own observers and status changes go
/// out on the `StatusEventBus`, so only background work reports here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Bulk import events
    Import(ImportEvent),
}

/// Events during a bulk import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ImportEvent {
    /// Import has started
    Started { total: usize },
    /// Weighted progress update
    Progress(ImportProgressUpdate),
    /// An item was stored in the library
    ItemImported { id: MediaId, label: String },
    /// A job failed; the remaining jobs are not run
    Failed { label: String, message: String },
    /// Import was cancelled between jobs
    Cancelled { imported: usize },
    /// Every job completed
    Completed { imported: usize },
}

/// Progress information during a bulk import
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ImportProgressUpdate {
    /// Number of jobs fully completed
    pub completed: usize,
    /// Total number of jobs
    pub total: usize,
    /// Overall progress in [0, 1]
    pub fraction: f64,
}

/// Notifications emitted by a browsing view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewEvent {
    /// Filters were re-applied; replay the change-set against the old list
    Filtered(ChangeSet),
    /// The item at this filtered position changed status
    ItemUpdated(usize),
    /// The source list was exchanged; reload everything
    Reloaded,
}
