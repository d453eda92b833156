//! Storage contracts consumed by the engine
//!
//! The engine only depends on the traits; the in-memory implementations back
//! the command line replay and the tests.

pub mod ratings;
pub mod records;

// Re-export commonly used types
pub use ratings::{InMemoryRatingStore, MockRatingStore, RatingStore};
pub use records::{InMemoryRecordStore, RecordStore};
