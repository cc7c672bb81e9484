//! Dotted document paths.
//!
//! Paths look like `<section>.<entity>.<stat>`, e.g.
//! `BSCS-1.6f9619ff-8b86-d011-b42d-00c04fc964ff.Points`. A stat key that
//! itself contains dots addresses a nested node.

use std::fmt;

use crate::error::{Result, StatsError};
use crate::types::EntityId;


/// A parsed, non-empty dotted path into the stats document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatPath {
    segments: Vec<String>,
}

impl StatPath {
    /// Parse a dotted string into segments.
    ///
    /// Rejects empty input and empty segments (`a..b`, `.a`, `a.`).
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(StatsError::InvalidPath("empty path".to_string()));
        }

        let mut segments = Vec::new();
        for part in input.split('.') {
            if part.is_empty() {
                return Err(StatsError::InvalidPath(format!(
                    "empty segment in path '{}'",
                    input
                )));
            }
            segments.push(part.to_string());
        }

        Ok(StatPath { segments })
    }

    /// Path of a whole section: `<section>`.
    pub fn section(section: &str) -> Result<Self> {
        Self::parse(section)
    }

    /// Path of one entity's record: `<section>.<entity>`.
    pub fn entity(section: &str, id: &EntityId) -> Result<Self> {
        Self::parse(&format!("{}.{}", section, id))
    }

    /// Path of a single stat: `<section>.<entity>.<key>`.
    pub fn stat(section: &str, id: &EntityId, key: &str) -> Result<Self> {
        Self::parse(&format!("{}.{}.{}", section, id, key))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Append one more segment (used when walking child keys).
    pub fn child(&self, key: &str) -> Result<Self> {
        Self::parse(&format!("{}.{}", self.to_dotted(), key))
    }

    /// Format back to a dotted string.
    pub fn to_dotted(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for StatPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dotted())
    }
}
