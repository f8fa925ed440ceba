//! Positional edits between two filter passes.

use serde::{Deserialize, Serialize};

/// One positional edit against a filtered list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "op", content = "at")]
pub enum ChangeSetEntry {
    Insert(usize),
    Remove(usize),
    Update(usize),
}

impl ChangeSetEntry {
    pub fn position(&self) -> usize {
        match self {
            ChangeSetEntry::Insert(at)
            | ChangeSetEntry::Remove(at)
            | ChangeSetEntry::Update(at) => *at,
        }
    }
}

/// Ordered edits turning one filtered list into the next
///
/// Entries are meant to be applied one at a time, in order. Removals come
/// first in descending position, followed by insertions in ascending
/// position, so every index is valid at the moment it is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet {
    entries: Vec<ChangeSetEntry>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff two masks over the same source list
    ///
    /// A removal is positioned by the number of old passes before it, an
    /// insertion by the number of new passes before it.
    pub fn between(old_mask: &[bool], new_mask: &[bool]) -> Self {
        debug_assert_eq!(old_mask.len(), new_mask.len());

        let mut removes = Vec::new();
        let mut inserts = Vec::new();
        let mut old_passes = 0;
        let mut new_passes = 0;

        for (&was, &is) in old_mask.iter().zip(new_mask) {
            match (was, is) {
                (true, false) => removes.push(ChangeSetEntry::Remove(old_passes)),
                (false, true) => inserts.push(ChangeSetEntry::Insert(new_passes)),
                _ => {}
            }
            if was {
                old_passes += 1;
            }
            if is {
                new_passes += 1;
            }
        }

        removes.reverse();
        removes.extend(inserts);
        Self { entries: removes }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChangeSetEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[ChangeSetEntry] {
        &self.entries
    }

    /// Replay the edits onto `list`
    ///
    /// `value_at` supplies the element for an insertion or update, given
    /// its position in the resulting list.
    pub fn apply_to<T>(&self, list: &mut Vec<T>, mut value_at: impl FnMut(usize) -> T) {
        for entry in &self.entries {
            match *entry {
                ChangeSetEntry::Remove(at) => {
                    list.remove(at);
                }
                ChangeSetEntry::Insert(at) => list.insert(at, value_at(at)),
                ChangeSetEntry::Update(at) => list[at] = value_at(at),
            }
        }
    }
}

impl FromIterator<ChangeSetEntry> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = ChangeSetEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ChangeSet {
    type Item = ChangeSetEntry;
    type IntoIter = std::vec::IntoIter<ChangeSetEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
