//! Expected-result (win probability) computation
//!
//! Wraps the Elo logistic curve from the skillratings crate and applies the
//! home advantage to the home side only.

use crate::types::SideValues;
use skillratings::elo::{expected_score, EloRating};

/// Win probability of a competitor rated `rating` against `opponent`
pub fn expected_result(rating: f64, opponent: f64) -> f64 {
    let (expected, _) = expected_score(
        &EloRating { rating },
        &EloRating { rating: opponent },
    );
    expected
}

/// Expected scores for both sides, with `home_advantage` added to the home rating
///
/// `home + away` is 1.0 up to floating point rounding.
pub fn expected_scores(home_rating: f64, away_rating: f64, home_advantage: f64) -> SideValues<f64> {
    let (home, away) = expected_score(
        &EloRating {
            rating: home_rating + home_advantage,
        },
        &EloRating {
            rating: away_rating,
        },
    );
    SideValues { home, away }
}
