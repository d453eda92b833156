//! Error types for the rating engine
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the engine, with typed variants for the cases callers recover from.

use crate::types::{CompetitorId, ContestId, SeasonId};

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific rating scenarios
#[derive(Debug, thiserror::Error)]
pub enum RatingError {
    #[error("Malformed contest {contest_id}: {reason}")]
    MalformedContest { contest_id: ContestId, reason: String },

    #[error("Contest {contest_id} ended in a tie, draws are not rated")]
    TiedContest { contest_id: ContestId },

    #[error("Fetching contests for {competitor_id} in season {season} failed: {message}")]
    FetchFailed {
        competitor_id: CompetitorId,
        season: SeasonId,
        message: String,
    },

    #[error("Invalid season range: {start} to {end}")]
    InvalidSeasonRange { start: SeasonId, end: SeasonId },

    #[error("Prediction not found: {contest_id}")]
    PredictionNotFound { contest_id: ContestId },

    #[error("Prediction for contest {contest_id} is already resolved")]
    AlreadyResolved { contest_id: ContestId },

    #[error("Contest mismatch: expected {expected}, got {actual}")]
    ContestMismatch {
        expected: ContestId,
        actual: ContestId,
    },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },
}

impl RatingError {
    /// Short label used when counting skipped contests
    pub fn kind(&self) -> &'static str {
        match self {
            RatingError::MalformedContest { .. } => "malformed",
            RatingError::TiedContest { .. } => "tied",
            RatingError::FetchFailed { .. } => "fetch_failed",
            RatingError::InvalidSeasonRange { .. } => "invalid_season_range",
            RatingError::PredictionNotFound { .. } => "prediction_not_found",
            RatingError::AlreadyResolved { .. } => "already_resolved",
            RatingError::ContestMismatch { .. } => "contest_mismatch",
            RatingError::ConfigurationError { .. } => "configuration",
            RatingError::StorageError { .. } => "storage",
        }
    }
}
