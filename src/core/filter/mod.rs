//! # Filter Module
//!
//! Composable predicates deciding which items a browsing view shows.
//!
//! ## Semantics
//! - A filter set is the logical AND of its predicates; an empty set
//!   matches everything.
//! - A predicate only rejects items it can classify. An item outside its
//!   domain (an edited variant seen by a status filter, or an id the store
//!   no longer resolves) matches vacuously.

use crate::core::library::{MediaItem, MediaKind, MediaStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A boolean predicate over an item
pub trait FilterPredicate: fmt::Debug {
    fn matches(&self, item: &MediaItem) -> bool;
}

/// Set of accepted triage statuses
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusFilter {
    statuses: BTreeSet<MediaStatus>,
}

impl StatusFilter {
    /// Accept nothing that has a status
    pub fn empty() -> Self {
        Self {
            statuses: BTreeSet::new(),
        }
    }

    /// Accept every status
    pub fn all() -> Self {
        MediaStatus::ALL.into_iter().collect()
    }

    pub fn contains(&self, status: MediaStatus) -> bool {
        self.statuses.contains(&status)
    }

    pub fn insert(&mut self, status: MediaStatus) -> bool {
        self.statuses.insert(status)
    }

    pub fn remove(&mut self, status: MediaStatus) -> bool {
        self.statuses.remove(&status)
    }

    pub fn with(mut self, status: MediaStatus) -> Self {
        self.statuses.insert(status);
        self
    }

    pub fn union(&self, other: &StatusFilter) -> StatusFilter {
        self.statuses.union(&other.statuses).copied().collect()
    }

    pub fn intersection(&self, other: &StatusFilter) -> StatusFilter {
        self.statuses.intersection(&other.statuses).copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = MediaStatus> + '_ {
        self.statuses.iter().copied()
    }
}

/// Unspecified and accepted items: the triage default
impl Default for StatusFilter {
    fn default() -> Self {
        [MediaStatus::Unspecified, MediaStatus::Accepted]
            .into_iter()
            .collect()
    }
}

impl FromIterator<MediaStatus> for StatusFilter {
    fn from_iter<I: IntoIterator<Item = MediaStatus>>(iter: I) -> Self {
        Self {
            statuses: iter.into_iter().collect(),
        }
    }
}

impl FilterPredicate for StatusFilter {
    fn matches(&self, item: &MediaItem) -> bool {
        match item.status() {
            Some(status) => self.contains(status),
            None => true,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.statuses.iter().map(|s| s.as_str()).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

/// Broad category of an item, as seen by [`KindFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindClass {
    Imported,
    Edited,
}

impl From<&MediaKind> for KindClass {
    fn from(kind: &MediaKind) -> Self {
        match kind {
            MediaKind::Imported { .. } => KindClass::Imported,
            MediaKind::Edited { .. } => KindClass::Edited,
        }
    }
}

/// Restricts a view to imported originals, edited variants, or both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KindFilter {
    kinds: BTreeSet<KindClass>,
}

impl KindFilter {
    pub fn all() -> Self {
        [KindClass::Imported, KindClass::Edited].into_iter().collect()
    }

    pub fn only(kind: KindClass) -> Self {
        [kind].into_iter().collect()
    }

    pub fn contains(&self, kind: KindClass) -> bool {
        self.kinds.contains(&kind)
    }
}

impl FromIterator<KindClass> for KindFilter {
    fn from_iter<I: IntoIterator<Item = KindClass>>(iter: I) -> Self {
        Self {
            kinds: iter.into_iter().collect(),
        }
    }
}

impl FilterPredicate for KindFilter {
    fn matches(&self, item: &MediaItem) -> bool {
        self.contains(KindClass::from(&item.kind))
    }
}

/// Ordered conjunction of predicates
///
/// Cloning is cheap and shares the predicates, which is what
/// `BrowsingView::create_copy` relies on.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    predicates: Vec<Arc<dyn FilterPredicate>>,
}

impl FilterSet {
    /// The empty set, which matches every item
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<P: FilterPredicate + 'static>(mut self, predicate: P) -> Self {
        self.predicates.push(Arc::new(predicate));
        self
    }

    pub fn push(&mut self, predicate: Arc<dyn FilterPredicate>) {
        self.predicates.push(predicate);
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// AND over every predicate; vacuously true for an empty set
    pub fn matches(&self, item: &MediaItem) -> bool {
        self.predicates.iter().all(|p| p.matches(item))
    }
}

impl From<StatusFilter> for FilterSet {
    fn from(filter: StatusFilter) -> Self {
        FilterSet::new().with(filter)
    }
}

impl From<KindFilter> for FilterSet {
    fn from(filter: KindFilter) -> Self {
        FilterSet::new().with(filter)
    }
}

impl FromIterator<Arc<dyn FilterPredicate>> for FilterSet {
    fn from_iter<I: IntoIterator<Item = Arc<dyn FilterPredicate>>>(iter: I) -> Self {
        Self {
            predicates: iter.into_iter().collect(),
        }
    }
}
