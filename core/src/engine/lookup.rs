//! Document-wide lookups, entry removal, and the full-clear lifecycle step.
//!
//! Every operation here reloads the document first so it sees the latest
//! flushed state, and none of them consult the cache.

use std::collections::BTreeMap;

use tracing::{info, warn};

use super::stats::StatsEngine;
use crate::document::StatPath;
use crate::types::{ClearOutcome, EntityId, StatValue};


/// Stat key read by [`StatsEngine::points_summary`].
pub const POINTS_KEY: &str = "Points";


impl StatsEngine {
    /// Delete `<section>.<id>` from the document.
    ///
    /// Returns true only if the entry existed and the save succeeded.
    pub fn remove_entry(&self, section: &str, id: &EntityId) -> bool {
        let Ok(path) = StatPath::entity(section, id) else {
            return false;
        };
        let Some(mut doc) = self.load_document("remove_entry") else {
            return false;
        };
        if !doc.remove(&path) {
            return false;
        }
        self.save_document(&doc, "remove_entry")
    }

    /// First top-level section holding a record for `id`.
    pub fn find_section_containing(&self, id: &EntityId) -> Option<String> {
        let doc = self.load_document("find_section_containing")?;
        let entity = id.to_string();
        doc.child_keys(None).into_iter().find(|section| {
            StatPath::section(section)
                .map(|p| doc.child_keys(Some(&p)).contains(&entity))
                .unwrap_or(false)
        })
    }

    /// First entity whose display-name stat equals `name`, ignoring case.
    /// Records keyed by something other than a valid id are skipped.
    pub fn find_entity_by_display_name(&self, name: &str) -> Option<EntityId> {
        let doc = self.load_document("find_entity_by_display_name")?;
        let wanted = name.to_lowercase();
        let key = &self.config().display_name_key;

        for section in doc.child_keys(None) {
            let Ok(section_path) = StatPath::section(&section) else {
                continue;
            };
            for entity in doc.child_keys(Some(&section_path)) {
                let Ok(path) = section_path.child(&entity).and_then(|p| p.child(key)) else {
                    continue;
                };
                let matches = match doc.get_stat(&path) {
                    Some(StatValue::Text(stored)) => stored.to_lowercase() == wanted,
                    _ => false,
                };
                if matches {
                    if let Ok(id) = entity.parse::<EntityId>() {
                        return Some(id);
                    }
                }
            }
        }
        None
    }

    /// Remove the entity's stats entirely.
    ///
    /// Runs three independent steps: remove the document entry, decrement
    /// the section's member count, clear the section assignment. All are
    /// attempted whatever the others do; there is no rollback, so a
    /// [`ClearOutcome::PartialFailure`] may leave the entry already gone.
    /// Pending cached stats for the entity are dropped first.
    pub fn clear_fully(&self, id: &EntityId) -> ClearOutcome {
        let section = self.resolver().section_of(id);
        self.discard_pending(id);

        let entry_removed = match &section {
            Some(s) => self.remove_entry(s, id),
            None => false,
        };
        let count_decremented = match &section {
            Some(s) => match self.resolver().decrement_member_count(s) {
                Ok(()) => true,
                Err(e) => {
                    warn!(entity = %id, section = %s, error = %e, "member count not decremented");
                    false
                }
            },
            None => false,
        };
        self.resolver().clear_assignment(id);

        let outcome = ClearOutcome::combine(section.is_some(), entry_removed, count_decremented);
        match (&outcome, &section) {
            (ClearOutcome::FullSuccess, Some(s)) => {
                info!(entity = %id, section = %s, "fully cleared stats")
            }
            (ClearOutcome::PartialFailure, Some(s)) => warn!(
                entity = %id,
                section = %s,
                entry_removed,
                count_decremented,
                "full clear partially failed"
            ),
            _ => {}
        }
        outcome
    }

    /// The entity's on-disk `Points`, or `None` without a section.
    pub fn points_summary(&self, id: &EntityId) -> Option<i64> {
        let section = self.resolver().section_of(id)?;
        let path = StatPath::stat(&section, id, POINTS_KEY).ok()?;
        let doc = self.load_document("points_summary")?;
        Some(doc.get_stat(&path).and_then(|v| v.as_i64()).unwrap_or(0))
    }

    /// All scalar stats stored on disk for `<section>.<id>`.
    pub fn entity_record(&self, section: &str, id: &EntityId) -> BTreeMap<String, StatValue> {
        let Ok(path) = StatPath::entity(section, id) else {
            return BTreeMap::new();
        };
        match self.load_document("entity_record") {
            Some(doc) => doc.record(&path),
            None => BTreeMap::new(),
        }
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::config::EngineConfig;
    use crate::document::{DocumentStore, MemoryStore};
    use crate::engine::{MapResolver, SectionResolver, StatsEngine};
    use crate::types::{ClearOutcome, EntityId, StatValue};

    const STEVE: &str = "6f9619ff-8b86-d011-b42d-00c04fc964ff";
    const ALEX: &str = "0b1c2d3e-4f50-6172-8394-a5b6c7d8e9f0";

    fn sample_yaml() -> String {
        format!(
            "BSCS-1:\n  {STEVE}:\n    Username: Steve\n    Points: 10\nBSIT-2:\n  {ALEX}:\n    Username: Alex\n    Points: 4\n  not-an-id:\n    Username: Ghost\n"
        )
    }

    fn engine_over(yaml: &str) -> (StatsEngine, Arc<MemoryStore>, Arc<MapResolver>) {
        let store = Arc::new(MemoryStore::with_yaml(yaml));
        let resolver = Arc::new(MapResolver::new());
        let engine = StatsEngine::new(EngineConfig::default(), store.clone(), resolver.clone());
        (engine, store, resolver)
    }

    fn id(s: &str) -> EntityId {
        s.parse().unwrap()
    }

    #[test]
    fn find_section_containing_scans_sections() {
        let (engine, _, _) = engine_over(&sample_yaml());
        assert_eq!(engine.find_section_containing(&id(STEVE)).as_deref(), Some("BSCS-1"));
        assert_eq!(engine.find_section_containing(&id(ALEX)).as_deref(), Some("BSIT-2"));
        assert_eq!(engine.find_section_containing(&EntityId::random()), None);
    }

    #[test]
    fn find_section_sees_latest_flush() {
        let (engine, _, resolver) = engine_over("");
        let e = EntityId::random();
        resolver.assign(e, "NEW");
        engine.set_stat(e, "Points", 1);
        assert_eq!(engine.find_section_containing(&e), None);
        engine.flush_pending();
        assert_eq!(engine.find_section_containing(&e).as_deref(), Some("NEW"));
    }

    #[test]
    fn find_by_display_name_ignores_case() {
        let (engine, _, _) = engine_over(&sample_yaml());
        assert_eq!(engine.find_entity_by_display_name("alex"), Some(id(ALEX)));
        assert_eq!(engine.find_entity_by_display_name("STEVE"), Some(id(STEVE)));
        assert_eq!(engine.find_entity_by_display_name("nobody"), None);
    }

    #[test]
    fn find_by_display_name_skips_invalid_ids() {
        let (engine, _, _) = engine_over(&sample_yaml());
        assert_eq!(engine.find_entity_by_display_name("ghost"), None);
    }

    #[test]
    fn find_by_display_name_uses_configured_key() {
        let store = Arc::new(MemoryStore::with_yaml(&format!("S:\n  {STEVE}:\n    Name: Steve\n")));
        let config = EngineConfig {
            display_name_key: "Name".into(),
            ..EngineConfig::default()
        };
        let engine = StatsEngine::new(config, store, Arc::new(MapResolver::new()));
        assert_eq!(engine.find_entity_by_display_name("steve"), Some(id(STEVE)));
    }

    #[test]
    fn remove_entry_reports_presence() {
        let (engine, store, _) = engine_over(&sample_yaml());
        assert!(engine.remove_entry("BSCS-1", &id(STEVE)));
        assert!(!engine.remove_entry("BSCS-1", &id(STEVE)));
        assert!(!engine.remove_entry("NOPE", &id(ALEX)));
        assert_eq!(store.save_count(), 1);
        assert!(!store.yaml().contains(STEVE));
    }

    #[test]
    fn remove_entry_fails_when_save_fails() {
        let (engine, store, _) = engine_over(&sample_yaml());
        store.set_fail_saves(true);
        assert!(!engine.remove_entry("BSCS-1", &id(STEVE)));
    }

    #[test]
    fn end_to_end_set_flush_remove() {
        let (engine, _, resolver) = engine_over("");
        let e = EntityId::random();
        resolver.assign(e, "BSCS-1");

        engine.set_stat(e, "Points", 10);
        assert_eq!(engine.get_stat_int(&e, "Points", 0), 10);

        let report = engine.flush_pending();
        assert!(report.persisted);

        assert!(engine.remove_entry("BSCS-1", &e));
        assert_eq!(engine.get_stat_int(&e, "Points", 0), 0);
    }

    #[test]
    fn clear_fully_success() {
        let (engine, store, resolver) = engine_over(&sample_yaml());
        let steve = id(STEVE);
        resolver.assign(steve, "BSCS-1");

        assert_eq!(engine.clear_fully(&steve), ClearOutcome::FullSuccess);
        assert_eq!(resolver.member_count("BSCS-1"), Some(0));
        assert_eq!(engine.find_section_containing(&steve), None);
        assert!(!store.yaml().contains(STEVE));
        assert_eq!(resolver.section_of(&steve), None);
    }

    #[test]
    fn clear_fully_partial_when_entry_missing() {
        let (engine, _, resolver) = engine_over("");
        let e = EntityId::random();
        resolver.assign(e, "BSCS-1");
        assert_eq!(engine.clear_fully(&e), ClearOutcome::PartialFailure);
        // Count step still ran.
        assert_eq!(resolver.member_count("BSCS-1"), Some(0));
    }

    #[test]
    fn clear_fully_partial_when_count_fails() {
        let (engine, store, resolver) = engine_over(&sample_yaml());
        let steve = id(STEVE);
        resolver.assign(steve, "BSCS-1");
        resolver.set_member_count("BSCS-1", 0);

        assert_eq!(engine.clear_fully(&steve), ClearOutcome::PartialFailure);
        // Entry removal is not rolled back.
        assert!(!store.yaml().contains(STEVE));
    }

    #[test]
    fn clear_fully_without_section_is_not_applicable() {
        let (engine, store, _) = engine_over(&sample_yaml());
        assert_eq!(engine.clear_fully(&id(STEVE)), ClearOutcome::NotApplicable);
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn clear_fully_drops_pending_stats() {
        let (engine, store, resolver) = engine_over("");
        let e = EntityId::random();
        resolver.assign(e, "S");
        engine.set_stat(e, "Points", 5);
        engine.clear_fully(&e);

        assert!(!engine.is_dirty(&e));
        assert!(engine.flush_pending().is_idle());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn points_summary_reads_disk() {
        let (engine, _, resolver) = engine_over(&sample_yaml());
        let steve = id(STEVE);
        assert_eq!(engine.points_summary(&steve), None);
        resolver.assign(steve, "BSCS-1");
        assert_eq!(engine.points_summary(&steve), Some(10));

        let fresh = EntityId::random();
        resolver.assign(fresh, "BSCS-1");
        assert_eq!(engine.points_summary(&fresh), Some(0));
    }

    #[test]
    fn entity_record_lists_stats() {
        let (engine, _, _) = engine_over(&sample_yaml());
        let rec = engine.entity_record("BSIT-2", &id(ALEX));
        assert_eq!(rec.get("Points"), Some(&StatValue::Integer(4)));
        assert_eq!(rec.get("Username"), Some(&StatValue::Text("Alex".into())));
        assert!(engine.entity_record("BSIT-2", &EntityId::random()).is_empty());
    }
}
