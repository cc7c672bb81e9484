//! In-memory side of the write-back cache: pending stats and the dirty set.

pub mod dirty;
pub mod stat_cache;

pub use dirty::DirtyTracker;
pub use stat_cache::{StatCache, StatMap};
