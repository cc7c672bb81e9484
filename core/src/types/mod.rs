//! Core value types: entity ids, stat values, and full-clear outcomes.

pub mod entity;
pub mod outcome;
pub mod value;

pub use entity::EntityId;
pub use outcome::ClearOutcome;
pub use value::{NumericKind, StatNumber, StatValue};
