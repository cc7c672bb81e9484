//! Per-entity stat cache.
//!
//! Each cached entity owns a mutex-guarded stat map, so read-modify-write
//! updates to one entity are serialized while different entities proceed
//! in parallel. A flush moves an entity's map into the in-flight overlay
//! before the entry leaves the cache, and the overlay is only cleared once
//! the save has finished; a read that misses the cache therefore checks the
//! overlay before falling back to disk and never sees a pre-flush value.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};

use crate::types::{EntityId, StatValue};


/// Stats held for one entity between flushes.
pub type StatMap = HashMap<String, StatValue>;


#[derive(Debug, Default)]
struct CacheEntry {
    stats: StatMap,
    /// Set once a flush has taken this entry; writers must retry on a fresh one.
    evicted: bool,
}

type SharedEntry = Arc<Mutex<CacheEntry>>;


#[derive(Debug, Default)]
pub struct StatCache {
    entries: DashMap<EntityId, SharedEntry>,
    in_flight: RwLock<HashMap<EntityId, StatMap>>,
}

impl StatCache {
    pub fn new() -> Self {
        StatCache {
            entries: DashMap::new(),
            in_flight: RwLock::new(HashMap::new()),
        }
    }

    /// Run `f` with exclusive access to `id`'s stat map, creating the entry
    /// if absent. Concurrent calls for the same entity run one at a time.
    pub fn with_entry<R>(&self, id: EntityId, f: impl FnOnce(&mut StatMap) -> R) -> R {
        loop {
            let entry = Arc::clone(self.entries.entry(id).or_default().value());
            let mut guard = entry.lock();
            if guard.evicted {
                drop(guard);
                self.entries.remove_if(&id, |_, current| Arc::ptr_eq(current, &entry));
                continue;
            }
            return f(&mut guard.stats);
        }
    }

    /// Newest unflushed value for (`id`, `key`): the live entry first,
    /// then whatever a flush currently has in flight.
    pub fn lookup(&self, id: &EntityId, key: &str) -> Option<StatValue> {
        let entry = self.entries.get(id).map(|e| Arc::clone(e.value()));
        if let Some(entry) = entry {
            let guard = entry.lock();
            if !guard.evicted {
                if let Some(value) = guard.stats.get(key) {
                    return Some(value.clone());
                }
            }
        }
        self.in_flight_value(id, key)
    }

    /// Value a running flush is writing for (`id`, `key`), if any.
    pub fn in_flight_value(&self, id: &EntityId, key: &str) -> Option<StatValue> {
        self.in_flight
            .read()
            .get(id)
            .and_then(|stats| stats.get(key))
            .cloned()
    }

    /// Take `id`'s stats for flushing and evict its entry.
    ///
    /// The stats are parked in the in-flight overlay until
    /// [`StatCache::finish_flush`] is called for the same id.
    pub fn take_for_flush(&self, id: &EntityId) -> Option<StatMap> {
        let entry = self.entries.get(id).map(|e| Arc::clone(e.value()))?;
        let stats = {
            let mut guard = entry.lock();
            if guard.evicted {
                return None;
            }
            guard.evicted = true;
            let stats = std::mem::take(&mut guard.stats);
            if !stats.is_empty() {
                self.in_flight
                    .write()
                    .entry(*id)
                    .or_default()
                    .extend(stats.clone());
            }
            stats
        };
        self.entries.remove_if(id, |_, current| Arc::ptr_eq(current, &entry));

        if stats.is_empty() {
            None
        } else {
            Some(stats)
        }
    }

    /// Drop the in-flight overlay for ids whose flush has completed.
    pub fn finish_flush<'a>(&self, ids: impl IntoIterator<Item = &'a EntityId>) {
        let mut in_flight = self.in_flight.write();
        for id in ids {
            in_flight.remove(id);
        }
    }

    /// Throw away everything cached for `id` without writing it.
    pub fn discard(&self, id: &EntityId) -> bool {
        match self.entries.remove(id) {
            Some((_, entry)) => {
                let mut guard = entry.lock();
                guard.evicted = true;
                let had_stats = !guard.stats.is_empty();
                guard.stats.clear();
                had_stats
            }
            None => false,
        }
    }

    pub fn is_cached(&self, id: &EntityId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of entities with a live cache entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
