//! The write-back stats engine.
//!
//! Updates land in the in-memory [`StatCache`] and mark the entity dirty;
//! nothing touches disk until a flush. A flush drains the dirty set,
//! reloads the document, writes every drained entity's stats under
//! `<section>.<entity>.<key>`, saves once, and evicts the flushed entries.
//! Reads check the cache first and otherwise reload the document.
//!
//! # Flush failure policy
//!
//! - An entity whose section cannot be resolved at flush time has its
//!   pending stats discarded (there is nowhere in the document to put them).
//! - A failed save is logged and reported in the [`FlushReport`]; the
//!   flushed stats are not re-queued and are lost unless written again.
//! - A failed reload aborts the cycle before anything is taken from the
//!   cache, and the drained ids are marked dirty again.

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::resolver::SectionResolver;
use super::scheduler::{ScheduledTask, Scheduler};
use crate::cache::{DirtyTracker, StatCache};
use crate::config::EngineConfig;
use crate::document::{Document, DocumentStore, StatPath};
use crate::error::Result;
use crate::types::{EntityId, NumericKind, StatNumber, StatValue};


/// What one flush cycle did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushReport {
    /// Entities whose stats were written into the document.
    pub written: Vec<EntityId>,
    /// Entities whose stats were dropped because they had no section.
    pub discarded: Vec<EntityId>,
    /// Whether the document was loaded and saved successfully. A cycle
    /// with nothing to flush counts as persisted.
    pub persisted: bool,
}

impl FlushReport {
    fn idle() -> Self {
        FlushReport {
            persisted: true,
            ..FlushReport::default()
        }
    }

    pub fn is_idle(&self) -> bool {
        self.written.is_empty() && self.discarded.is_empty()
    }
}


pub struct StatsEngine {
    config: EngineConfig,
    store: Arc<dyn DocumentStore>,
    resolver: Arc<dyn SectionResolver>,
    cache: StatCache,
    dirty: DirtyTracker,
    /// Serializes flush cycles so their reload/save pairs never interleave.
    flush_lock: Mutex<()>,
    scheduled: Mutex<Option<ScheduledTask>>,
}

impl StatsEngine {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn DocumentStore>,
        resolver: Arc<dyn SectionResolver>,
    ) -> Self {
        StatsEngine {
            config,
            store,
            resolver,
            cache: StatCache::new(),
            dirty: DirtyTracker::new(),
            flush_lock: Mutex::new(()),
            scheduled: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn resolver(&self) -> &dyn SectionResolver {
        self.resolver.as_ref()
    }

    // -------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------

    /// Check the document loads, then register the periodic flush with
    /// `scheduler`. The scheduled task holds only a weak reference, so
    /// dropping the last engine handle stops it.
    pub fn initialize(self: &Arc<Self>, scheduler: &dyn Scheduler) -> Result<()> {
        self.store.load()?;

        let engine: Weak<StatsEngine> = Arc::downgrade(self);
        let task = scheduler.schedule_repeating(
            self.config.flush_interval(),
            Box::new(move || {
                if let Some(engine) = engine.upgrade() {
                    engine.flush_pending();
                }
            }),
        )?;

        if let Some(previous) = self.scheduled.lock().replace(task) {
            previous.cancel();
        }
        info!(
            store = %self.store.location(),
            interval_ms = self.config.flush_interval_ms,
            "stats engine initialized"
        );
        Ok(())
    }

    /// Stop the periodic flush and write out everything still pending.
    pub fn shutdown(&self) -> FlushReport {
        let task = self.scheduled.lock().take();
        if let Some(task) = task {
            task.cancel();
        }
        let report = self.flush_pending();
        info!(
            written = report.written.len(),
            persisted = report.persisted,
            "stats engine shut down"
        );
        report
    }

    // -------------------------------------------------------------------
    // Updates
    // -------------------------------------------------------------------

    /// Overwrite the cached value of a stat and mark the entity dirty.
    pub fn set_stat(&self, id: EntityId, key: &str, value: impl Into<StatValue>) {
        let value = value.into();
        self.cache.with_entry(id, |stats| {
            stats.insert(key.to_string(), value);
            self.dirty.mark_dirty(id);
        });
    }

    /// Add `delta` to a numeric stat and return the new value.
    ///
    /// The current value comes from the cache, else from disk with a zero
    /// default read as `delta`'s kind. The read-modify-write holds the
    /// entity's cache lock, so concurrent increments are never lost.
    pub fn increase_stat(&self, id: EntityId, key: &str, delta: impl Into<StatNumber>) -> StatNumber {
        let delta = delta.into();
        self.cache.with_entry(id, |stats| {
            let cached = stats
                .get(key)
                .and_then(StatValue::as_number)
                .or_else(|| self.cache.in_flight_value(&id, key).and_then(|v| v.as_number()));
            let current = match cached {
                Some(n) => n,
                None => self.disk_number(&id, key, delta.kind()),
            };

            let result = current.widening_add(delta);
            stats.insert(key.to_string(), result.into());
            self.dirty.mark_dirty(id);
            result
        })
    }

    /// Write a stat straight to disk, bypassing the cache: reload, set,
    /// save. Returns false if the entity has no section or the save fails.
    pub fn set_stat_raw(&self, id: EntityId, key: &str, value: impl Into<StatValue>) -> bool {
        let Some(section) = self.resolver.section_of(&id) else {
            debug!(entity = %id, key, "raw set skipped: no section");
            return false;
        };
        let path = match StatPath::stat(&section, &id, key) {
            Ok(p) => p,
            Err(e) => {
                warn!(entity = %id, key, error = %e, "raw set skipped");
                return false;
            }
        };
        let Some(mut doc) = self.load_document("set_stat_raw") else {
            return false;
        };
        doc.set_stat(&path, &value.into());
        self.save_document(&doc, "set_stat_raw")
    }

    // -------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------

    /// Raw on-disk value of a stat, always from a fresh reload.
    pub fn get_stat(&self, id: &EntityId, key: &str) -> Option<StatValue> {
        let section = self.resolver.section_of(id)?;
        let path = StatPath::stat(&section, id, key).ok()?;
        self.load_document("get_stat")?.get_stat(&path)
    }

    /// Integer view of a stat: the cached value if numeric, else the
    /// on-disk value, else `default`. Floats truncate.
    pub fn get_stat_int(&self, id: &EntityId, key: &str, default: i64) -> i64 {
        match self.cache.lookup(id, key).and_then(|v| v.as_number()) {
            Some(n) => n.as_i64(),
            None => self.disk_stat(id, key).and_then(|v| v.as_i64()).unwrap_or(default),
        }
    }

    /// Float view of a stat, with the same lookup order as [`Self::get_stat_int`].
    pub fn get_stat_double(&self, id: &EntityId, key: &str, default: f64) -> f64 {
        match self.cache.lookup(id, key).and_then(|v| v.as_number()) {
            Some(n) => n.as_f64(),
            None => self.disk_stat(id, key).and_then(|v| v.as_f64()).unwrap_or(default),
        }
    }

    // -------------------------------------------------------------------
    // Flush
    // -------------------------------------------------------------------

    /// Flush every dirty entity. Safe to call on demand as well as from
    /// the scheduler; concurrent calls run one after the other.
    pub fn flush_pending(&self) -> FlushReport {
        let snapshot = self.dirty.drain();
        if snapshot.is_empty() {
            return FlushReport::idle();
        }
        self.batch_save(&snapshot)
    }

    /// Write the cached stats of `ids` into a freshly loaded document and
    /// save it once. Flushed entries are evicted from the cache.
    pub fn batch_save(&self, ids: &HashSet<EntityId>) -> FlushReport {
        let _flush = self.flush_lock.lock();

        let Some(mut doc) = self.load_document("batch_save") else {
            for id in ids {
                self.dirty.mark_dirty(*id);
            }
            return FlushReport::default();
        };

        let mut report = FlushReport::default();
        let mut taken = Vec::new();

        for id in ids {
            let Some(stats) = self.cache.take_for_flush(id) else {
                continue;
            };
            taken.push(*id);

            let Some(section) = self.resolver.section_of(id) else {
                warn!(entity = %id, stats = stats.len(), "no section for entity, discarding pending stats");
                report.discarded.push(*id);
                continue;
            };

            for (key, value) in &stats {
                match StatPath::stat(&section, id, key) {
                    Ok(path) => doc.set_stat(&path, value),
                    Err(e) => warn!(entity = %id, key = %key, error = %e, "skipping unwritable stat"),
                }
            }
            report.written.push(*id);
        }

        report.persisted = if report.written.is_empty() && report.discarded.is_empty() {
            true
        } else {
            self.save_document(&doc, "batch_save")
        };
        self.cache.finish_flush(&taken);

        debug!(
            written = report.written.len(),
            discarded = report.discarded.len(),
            persisted = report.persisted,
            "flush cycle complete"
        );
        report
    }

    // -------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------

    /// Number of entities waiting for the next flush.
    pub fn pending_count(&self) -> usize {
        self.dirty.len()
    }

    pub fn is_dirty(&self, id: &EntityId) -> bool {
        self.dirty.is_dirty(id)
    }

    /// Drop an entity's pending stats and dirty mark without writing them.
    pub(crate) fn discard_pending(&self, id: &EntityId) -> bool {
        let had_stats = self.cache.discard(id);
        let was_dirty = self.dirty.discard(id);
        had_stats || was_dirty
    }

    // -------------------------------------------------------------------
    // Internal: disk access
    // -------------------------------------------------------------------

    pub(crate) fn load_document(&self, operation: &'static str) -> Option<Document> {
        match self.store.load() {
            Ok(doc) => Some(doc),
            Err(e) => {
                error!(operation, store = %self.store.location(), error = %e, "could not load stats document");
                None
            }
        }
    }

    pub(crate) fn save_document(&self, doc: &Document, operation: &'static str) -> bool {
        match self.store.save(doc) {
            Ok(()) => true,
            Err(e) => {
                error!(operation, store = %self.store.location(), error = %e, "could not save stats document");
                false
            }
        }
    }

    fn disk_stat(&self, id: &EntityId, key: &str) -> Option<StatValue> {
        self.get_stat(id, key)
    }

    fn disk_number(&self, id: &EntityId, key: &str, kind: NumericKind) -> StatNumber {
        let Some(stored) = self.disk_stat(id, key) else {
            return StatNumber::zero(kind);
        };
        match kind {
            NumericKind::Integer => stored.as_i64().map_or(StatNumber::zero(kind), StatNumber::Integer),
            NumericKind::Float => stored.as_f64().map_or(StatNumber::zero(kind), StatNumber::Float),
        }
    }
}

impl std::fmt::Debug for StatsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsEngine")
            .field("store", &self.store.location())
            .field("cached", &self.cache.len())
            .field("dirty", &self.dirty.len())
            .finish()
    }
}
