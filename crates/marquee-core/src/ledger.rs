//! Dedup ledger: which ids exist, and which are still missing from a collection.
//!
//! The backlog in the checkpoint keeps every id Discovery ever saw, so the
//! same movie shows up many times as popularity rankings shift between
//! pages and runs. [`UniqueIds`] collapses it to one entry per id in
//! first-seen order, which keeps detail-stage processing reproducible.

use std::collections::HashSet;

use crate::models::{Document, EntityId, document_id};

/// Unique ids derived from the raw backlog, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniqueIds {
    ordered: Vec<EntityId>,
    members: HashSet<EntityId>,
}

impl UniqueIds {
    /// Derives the unique ids of a backlog.
    ///
    /// # Examples
    ///
    /// ```
    /// use marquee_core::ledger::UniqueIds;
    ///
    /// let ids = UniqueIds::from_backlog(&[7, 8, 7, 3, 8]);
    /// assert_eq!(ids.as_slice(), &[7, 8, 3]);
    /// ```
    pub fn from_backlog(backlog: &[EntityId]) -> Self {
        let mut ids = Self::default();
        for &id in backlog {
            if ids.members.insert(id) {
                ids.ordered.push(id);
            }
        }
        ids
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.members.contains(&id)
    }

    pub fn as_slice(&self) -> &[EntityId] {
        &self.ordered
    }

    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.ordered.iter().copied()
    }

    /// Ids not present in `seen`, in first-seen order.
    pub fn missing_from(&self, seen: &HashSet<EntityId>) -> Vec<EntityId> {
        self.iter().filter(|id| !seen.contains(id)).collect()
    }
}

/// Ids already present in a stored collection.
#[derive(Debug, Clone, Default)]
pub struct SeenIds {
    pub ids: HashSet<EntityId>,
    /// Records without a usable numeric `id` (ignored for dedup).
    pub unkeyed: usize,
}

/// Reads the `id` field of every record in a collection.
///
/// Records lacking a numeric `id` are counted in [`SeenIds::unkeyed`] rather
/// than failing the stage; they never mark any id as handled.
pub fn seen_ids(records: &[Document]) -> SeenIds {
    let mut seen = SeenIds::default();
    for record in records {
        match document_id(record) {
            Some(id) => {
                seen.ids.insert(id);
            }
            None => seen.unkeyed += 1,
        }
    }
    seen
}
