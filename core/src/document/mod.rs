//! The persisted stats document.
//!
//! Dotted-path addressing (`section.entity.stat`), an in-memory YAML tree,
//! and the stores that load and save it.

pub mod path;
pub mod store;
pub mod tree;

pub use path::StatPath;
pub use store::{DocumentStore, MemoryStore, YamlFileStore};
pub use tree::Document;
