//! The write-back engine and the host-side contracts it depends on.
//!
//! [`StatsEngine`] owns the cache and dirty set and talks to disk only
//! through a [`DocumentStore`](crate::document::DocumentStore). Section
//! resolution and periodic scheduling are supplied by the host via
//! [`SectionResolver`] and [`Scheduler`].

pub mod lookup;
pub mod resolver;
pub mod scheduler;
pub mod stats;

pub use lookup::POINTS_KEY;
pub use resolver::{MapResolver, SectionResolver};
pub use scheduler::{ScheduledTask, Scheduler, Task, ThreadScheduler};
pub use stats::{FlushReport, StatsEngine};
