//! In-memory stats document.
//!
//! A YAML mapping tree addressed by [`StatPath`]. Sections sit at the top
//! level, entity records below them, stats below those. Keys are matched
//! by their string form, so a section named `101` (a YAML integer key)
//! is still found by the path segment `"101"`.

use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};

use super::path::StatPath;
use crate::types::StatValue;


/// The whole stats document as loaded from the backing store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    root: Mapping,
}

impl Document {
    /// An empty document.
    pub fn new() -> Self {
        Document { root: Mapping::new() }
    }

    /// Parse YAML text. Blank text and an explicit `null` give an empty
    /// document; any other non-mapping top level is an error.
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Document::new());
        }
        let root: Option<Mapping> = serde_yaml::from_str(content)?;
        Ok(Document {
            root: root.unwrap_or_default(),
        })
    }

    pub fn to_yaml_string(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.root)
    }

    /// Raw node at `path`, if present.
    pub fn get(&self, path: &StatPath) -> Option<&Value> {
        let (last, parents) = path.segments().split_last()?;
        let mut map = &self.root;
        for seg in parents {
            map = lookup(map, seg)?.as_mapping()?;
        }
        lookup(map, last)
    }

    /// Scalar stat at `path`. Nested sections are not stats.
    pub fn get_stat(&self, path: &StatPath) -> Option<StatValue> {
        self.get(path).and_then(StatValue::from_yaml)
    }

    pub fn contains(&self, path: &StatPath) -> bool {
        self.get(path).is_some()
    }

    /// Set `path` to `value`, or delete it when `value` is `None`.
    ///
    /// Missing intermediate nodes are created; a scalar sitting where an
    /// intermediate mapping is needed gets replaced. Returns whether the
    /// document changed (a delete of an absent path returns false).
    pub fn set(&mut self, path: &StatPath, value: Option<Value>) -> bool {
        let Some((last, parents)) = path.segments().split_last() else {
            return false;
        };

        match value {
            Some(value) => {
                let mut map = &mut self.root;
                for seg in parents {
                    map = child_mapping_mut(map, seg);
                }
                match lookup_mut(map, last) {
                    Some(slot) => *slot = value,
                    None => {
                        map.insert(Value::String(last.clone()), value);
                    }
                }
                true
            }
            None => {
                let mut map = &mut self.root;
                for seg in parents {
                    map = match lookup_mut(map, seg) {
                        Some(Value::Mapping(m)) => m,
                        _ => return false,
                    };
                }
                remove_key(map, last).is_some()
            }
        }
    }

    /// Write a stat value at `path`.
    pub fn set_stat(&mut self, path: &StatPath, value: &StatValue) {
        self.set(path, Some(value.to_yaml()));
    }

    /// Delete the node at `path`. Returns whether anything was removed.
    pub fn remove(&mut self, path: &StatPath) -> bool {
        self.set(path, None)
    }

    /// Names of the direct children of `path` (the top level for `None`).
    /// Scalars and missing paths have no children.
    pub fn child_keys(&self, path: Option<&StatPath>) -> Vec<String> {
        let map = match path {
            None => &self.root,
            Some(p) => match self.get(p).and_then(Value::as_mapping) {
                Some(m) => m,
                None => return Vec::new(),
            },
        };
        map.keys().filter_map(key_to_string).collect()
    }

    /// Scalar stats directly under `path`, keyed by stat name.
    pub fn record(&self, path: &StatPath) -> BTreeMap<String, StatValue> {
        let mut out = BTreeMap::new();
        if let Some(map) = self.get(path).and_then(Value::as_mapping) {
            for (k, v) in map {
                if let (Some(name), Some(stat)) = (key_to_string(k), StatValue::from_yaml(v)) {
                    out.insert(name, stat);
                }
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}


// ---------------------------------------------------------------------------
// Internal: key matching
// ---------------------------------------------------------------------------

fn key_to_string(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn key_matches(key: &Value, segment: &str) -> bool {
    match key {
        Value::String(s) => s == segment,
        other => key_to_string(other).as_deref() == Some(segment),
    }
}

fn lookup<'a>(map: &'a Mapping, segment: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| key_matches(k, segment))
        .map(|(_, v)| v)
}

fn lookup_mut<'a>(map: &'a mut Mapping, segment: &str) -> Option<&'a mut Value> {
    map.iter_mut()
        .find(|(k, _)| key_matches(k, segment))
        .map(|(_, v)| v)
}

fn remove_key(map: &mut Mapping, segment: &str) -> Option<Value> {
    let key = map.keys().find(|k| key_matches(k, segment)).cloned()?;
    map.remove(&key)
}

fn child_mapping_mut<'a>(map: &'a mut Mapping, segment: &str) -> &'a mut Mapping {
    let key = map
        .keys()
        .find(|k| key_matches(k, segment))
        .cloned()
        .unwrap_or_else(|| Value::String(segment.to_string()));

    if !matches!(map.get(&key), Some(Value::Mapping(_))) {
        map.insert(key.clone(), Value::Mapping(Mapping::new()));
    }
    match map.get_mut(&key) {
        Some(Value::Mapping(m)) => m,
        _ => unreachable!("intermediate node was just made a mapping"),
    }
}
