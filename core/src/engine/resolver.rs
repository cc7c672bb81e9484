//! Entity → section resolution.
//!
//! Which section an entity belongs to lives outside the stats document
//! (in the host's player data), so the engine only sees it through
//! [`SectionResolver`]. [`MapResolver`] is an in-memory implementation for
//! hosts without their own assignment store, and for tests.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{Result, StatsError};
use crate::types::EntityId;


pub trait SectionResolver: Send + Sync {
    /// Section the entity is assigned to, if any.
    fn section_of(&self, id: &EntityId) -> Option<String>;

    /// Decrement the aggregate member count of a section.
    fn decrement_member_count(&self, section: &str) -> Result<()>;

    /// Remove the entity's section assignment.
    fn clear_assignment(&self, id: &EntityId);
}


/// Section assignments and member counts held in memory.
#[derive(Debug, Default)]
pub struct MapResolver {
    assignments: RwLock<HashMap<EntityId, String>>,
    member_counts: RwLock<HashMap<String, u32>>,
}

impl MapResolver {
    pub fn new() -> Self {
        MapResolver::default()
    }

    /// Assign an entity to a section, bumping the section's member count.
    /// Re-assigning moves the entity and adjusts both counts.
    pub fn assign(&self, id: EntityId, section: &str) {
        let previous = self.assignments.write().insert(id, section.to_string());
        let mut counts = self.member_counts.write();
        if let Some(prev) = previous {
            if let Some(count) = counts.get_mut(&prev) {
                *count = count.saturating_sub(1);
            }
        }
        *counts.entry(section.to_string()).or_insert(0) += 1;
    }

    /// Overwrite a section's member count.
    pub fn set_member_count(&self, section: &str, count: u32) {
        self.member_counts.write().insert(section.to_string(), count);
    }

    pub fn member_count(&self, section: &str) -> Option<u32> {
        self.member_counts.read().get(section).copied()
    }
}

impl SectionResolver for MapResolver {
    fn section_of(&self, id: &EntityId) -> Option<String> {
        self.assignments.read().get(id).cloned()
    }

    fn decrement_member_count(&self, section: &str) -> Result<()> {
        let mut counts = self.member_counts.write();
        match counts.get_mut(section) {
            Some(count) if *count > 0 => {
                *count -= 1;
                Ok(())
            }
            Some(_) => Err(StatsError::Resolver(format!(
                "section '{}' already has no members",
                section
            ))),
            None => Err(StatsError::Resolver(format!("unknown section '{}'", section))),
        }
    }

    fn clear_assignment(&self, id: &EntityId) {
        self.assignments.write().remove(id);
    }
}
