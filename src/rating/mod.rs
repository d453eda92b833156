//! Elo rating model
//!
//! This module provides the expected-result function, the margin-of-victory
//! K-factor policy, pluggable matchup adjustments, and the processor that
//! applies one contest result to a rating snapshot.

pub mod expected;
pub mod k_factor;
pub mod matchup;
pub mod processor;

// Re-export commonly used types
pub use expected::{expected_result, expected_scores};
pub use k_factor::{adjusted_k, KFactorPolicy};
pub use matchup::{HeadToHeadLog, MatchupAdjustment, NoMatchupAdjustment, RecentHeadToHead};
pub use processor::{GameOutcome, GameOutcomeProcessor};
