//! The filtered, ordered projection consumed by presentation surfaces.

use super::{ChangeSet, ChangeSetEntry};
use crate::config::Config;
use crate::core::filter::FilterSet;
use crate::core::library::{MediaId, MediaStore};
use crate::core::status::{StatusEventBus, StatusSubscription};
use crate::error::StoreError;
use crate::events::{EventChannel, EventReceiver, EventSender, ViewEvent};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// A filtered view over a creation-ordered list of ids
///
/// The view caches the last filter evaluation as a mask over its source
/// list. The mask is only recomputed by [`set_filters`](Self::set_filters),
/// [`refilter`](Self::refilter) and [`set_source_ids`](Self::set_source_ids);
/// a status change never moves an item in or out of the view on its own.
///
/// Views are owned by one thread and compare equal only by identity.
pub struct BrowsingView {
    id: Uuid,
    store: Arc<dyn MediaStore>,
    bus: StatusEventBus,
    subscription: StatusSubscription,
    filters: FilterSet,
    source_ids: Vec<MediaId>,
    mask: Vec<bool>,
    filtered_ids: Vec<MediaId>,
    observers: Vec<EventSender<ViewEvent>>,
}

impl BrowsingView {
    /// Empty view filtered by the configured default status filter
    pub fn new(store: Arc<dyn MediaStore>, bus: StatusEventBus, config: &Config) -> Self {
        let subscription = bus.subscribe();
        Self {
            id: Uuid::new_v4(),
            store,
            bus,
            subscription,
            filters: FilterSet::from(config.default_filter.clone()),
            source_ids: Vec::new(),
            mask: Vec::new(),
            filtered_ids: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// View over every item currently in the store
    pub fn from_store(
        store: Arc<dyn MediaStore>,
        bus: StatusEventBus,
        config: &Config,
    ) -> Result<Self, StoreError> {
        let ids = store.ids()?;
        let mut view = Self::new(store, bus, config);
        view.set_source_ids(ids);
        Ok(view)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn source_ids(&self) -> &[MediaId] {
        &self.source_ids
    }

    /// The filtered ids, in source order
    pub fn ids(&self) -> &[MediaId] {
        &self.filtered_ids
    }

    /// Exchange the source list and re-evaluate every item
    ///
    /// Observers only get [`ViewEvent::Reloaded`]; no change-set is
    /// produced.
    pub fn set_source_ids(&mut self, ids: Vec<MediaId>) {
        self.source_ids = ids;
        self.mask = self.evaluate();
        self.rebuild_filtered();

        debug!(
            view = %self.id,
            source = self.source_ids.len(),
            visible = self.filtered_ids.len(),
            "reloaded view"
        );
        self.emit(ViewEvent::Reloaded);
    }

    /// Replace the predicates and re-evaluate every item
    pub fn set_filters(&mut self, filters: impl Into<FilterSet>) -> ChangeSet {
        self.filters = filters.into();
        self.refilter()
    }

    /// Re-evaluate every item against the current predicates
    ///
    /// Picks up status changes that happened since the last pass.
    pub fn refilter(&mut self) -> ChangeSet {
        let new_mask = self.evaluate();
        let changes = ChangeSet::between(&self.mask, &new_mask);
        self.mask = new_mask;
        self.rebuild_filtered();

        debug!(
            view = %self.id,
            visible = self.filtered_ids.len(),
            changes = changes.len(),
            "applied filters"
        );
        if !changes.is_empty() {
            self.emit(ViewEvent::Filtered(changes.clone()));
        }
        changes
    }

    /// Report an item whose attributes changed
    ///
    /// Returns the `Update` entry for its current position, or `None` if
    /// the item is not visible. Membership is left untouched.
    pub fn item_changed(&mut self, id: MediaId) -> Option<ChangeSetEntry> {
        let position = self.filtered_ids.iter().position(|&visible| visible == id)?;
        self.emit(ViewEvent::ItemUpdated(position));
        Some(ChangeSetEntry::Update(position))
    }

    /// Turn every pending status event into an `item_changed` call
    pub fn process_status_events(&mut self) -> Vec<ChangeSetEntry> {
        self.subscription
            .drain()
            .into_iter()
            .filter_map(|event| self.item_changed(event.id))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.filtered_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtered_ids.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<MediaId> {
        self.filtered_ids.get(index).copied()
    }

    pub fn index_after(&self, index: usize) -> Option<usize> {
        let next = index.checked_add(1)?;
        (next < self.count()).then_some(next)
    }

    pub fn index_before(&self, index: usize) -> Option<usize> {
        if index == 0 || index > self.count() {
            return None;
        }
        Some(index - 1)
    }

    /// Independent view with the same source list and predicates
    ///
    /// The copy shares store and bus but has its own identity and
    /// subscription. Its mask is evaluated against current store state, so
    /// statuses this view has seen but not yet refiltered already apply.
    pub fn create_copy(&self) -> Self {
        let mut copy = Self {
            id: Uuid::new_v4(),
            store: Arc::clone(&self.store),
            bus: self.bus.clone(),
            subscription: self.bus.subscribe(),
            filters: self.filters.clone(),
            source_ids: self.source_ids.clone(),
            mask: Vec::new(),
            filtered_ids: Vec::new(),
            observers: Vec::new(),
        };
        copy.mask = copy.evaluate();
        copy.rebuild_filtered();
        copy
    }

    /// Receive this view's change notifications
    pub fn subscribe(&mut self) -> EventReceiver<ViewEvent> {
        let (sender, receiver) = EventChannel::new();
        self.observers.push(sender);
        receiver
    }

    fn evaluate(&self) -> Vec<bool> {
        self.source_ids
            .iter()
            .map(|&id| match self.store.by_id(id) {
                Ok(Some(item)) => self.filters.matches(&item),
                Ok(None) => true,
                Err(e) => {
                    warn!(%id, error = %e, "could not load item for filtering");
                    true
                }
            })
            .collect()
    }

    fn rebuild_filtered(&mut self) {
        self.filtered_ids = self
            .source_ids
            .iter()
            .zip(&self.mask)
            .filter(|(_, &pass)| pass)
            .map(|(&id, _)| id)
            .collect();
    }

    fn emit(&mut self, event: ViewEvent) {
        self.observers.retain(|observer| observer.try_send(event.clone()));
    }
}

impl PartialEq for BrowsingView {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for BrowsingView {}

impl fmt::Debug for BrowsingView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowsingView")
            .field("id", &self.id)
            .field("filters", &self.filters)
            .field("source", &self.source_ids.len())
            .field("visible", &self.filtered_ids.len())
            .finish()
    }
}
