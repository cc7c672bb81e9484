//! Statledger core: a write-back cache for per-entity stats.
//!
//! Many callers update an entity's stats in memory; a periodic flush
//! batches the updates into one save of a sectioned YAML document laid
//! out as `<section>.<entity>.<stat>`. Reads see the cached value when
//! one is pending, otherwise the freshly reloaded document.
//!
//! ```no_run
//! use std::sync::Arc;
//! use statledger_core::{EngineConfig, EntityId, MapResolver, StatsEngine, ThreadScheduler, YamlFileStore};
//!
//! let config = EngineConfig::default();
//! let store = Arc::new(YamlFileStore::new(&config.stats_file));
//! let resolver = Arc::new(MapResolver::new());
//! let engine = Arc::new(StatsEngine::new(config, store, resolver.clone()));
//! engine.initialize(&ThreadScheduler::default()).unwrap();
//!
//! let player = EntityId::random();
//! resolver.assign(player, "BSCS-1");
//! engine.increase_stat(player, "Points", 5);
//! assert_eq!(engine.get_stat_int(&player, "Points", 0), 5);
//! engine.shutdown();
//! ```

pub mod cache;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod types;

pub use config::EngineConfig;
pub use document::{Document, DocumentStore, MemoryStore, StatPath, YamlFileStore};
pub use engine::{
    FlushReport, MapResolver, ScheduledTask, Scheduler, SectionResolver, StatsEngine,
    ThreadScheduler,
};
pub use error::{Result, StatsError};
pub use types::{ClearOutcome, EntityId, NumericKind, StatNumber, StatValue};
