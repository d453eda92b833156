//! Season-level processing
//!
//! This module gathers contests through the fetch capability, folds a season
//! in chronological order, and carries ratings from one season to the next.

pub mod fetch;
pub mod orchestrator;
pub mod processor;

// Re-export commonly used types
pub use fetch::{gather_contests, ContestFetcher, FetchFailurePolicy, StaticContestFetcher};
pub use orchestrator::{CarryOver, RunSummary, SeasonOrchestrator, SeasonReport, SeasonStatus};
pub use processor::{order_contests, SeasonOutcome, SeasonProcessor, SkippedContest};
