//! Dirty tracking for write-back flushes.

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::types::EntityId;


/// Set of entities with cached updates not yet written to the document.
///
/// Marking is cheap and lock-scoped; [`DirtyTracker::drain`] swaps the
/// whole set out under the same lock, so a concurrent mark lands either in
/// the drained snapshot or in the set left behind for the next flush.
#[derive(Debug, Default)]
pub struct DirtyTracker {
    ids: Mutex<HashSet<EntityId>>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        DirtyTracker {
            ids: Mutex::new(HashSet::new()),
        }
    }

    /// Mark an entity as needing a flush. Idempotent.
    pub fn mark_dirty(&self, id: EntityId) {
        self.ids.lock().insert(id);
    }

    pub fn is_dirty(&self, id: &EntityId) -> bool {
        self.ids.lock().contains(id)
    }

    /// Atomically take every dirty id, leaving the set empty.
    pub fn drain(&self) -> HashSet<EntityId> {
        std::mem::take(&mut *self.ids.lock())
    }

    /// Forget a single entity without flushing it.
    pub fn discard(&self, id: &EntityId) -> bool {
        self.ids.lock().remove(id)
    }

    pub fn len(&self) -> usize {
        self.ids.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.lock().is_empty()
    }
}
