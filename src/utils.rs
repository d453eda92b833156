//! Utility functions for the rating engine

use chrono::{DateTime, Utc};

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Absolute score difference between two sides
pub fn margin_of_victory(home_score: u32, away_score: u32) -> u32 {
    home_score.abs_diff(away_score)
}

/// Calculate the absolute difference between two ratings
pub fn rating_difference(rating1: f64, rating2: f64) -> f64 {
    (rating1 - rating2).abs()
}
