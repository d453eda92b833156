//! Rating Ledger - historical and incremental Elo ratings for head-to-head seasons
//!
//! This crate replays seasons of two-competitor contests in chronological
//! order, maintains Elo-style ratings with home advantage and margin-scaled
//! K-factors, and records a pre-contest prediction for every contest it scores.

pub mod config;
pub mod error;
pub mod metrics;
pub mod prediction;
pub mod rating;
pub mod season;
pub mod storage;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RatingError, Result};
pub use types::*;

// Re-export key components
pub use rating::processor::GameOutcomeProcessor;
pub use season::{ContestFetcher, SeasonOrchestrator, SeasonProcessor, StaticContestFetcher};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
