//! Forecasts for unplayed contests and resolution once they complete

use crate::config::RatingConfig;
use crate::error::{RatingError, Result};
use crate::rating::expected::expected_scores;
use crate::rating::matchup::{configured_adjustment, HeadToHeadLog, MatchupAdjustment};
use crate::rating::processor::{actual_scores, winner_of};
use crate::types::{
    CompetitorId, Contest, Prediction, PredictionResolution, RatingMap, Side, SideValues,
};
use crate::utils::{current_timestamp, rating_difference};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Side favoured by the expected scores. An exact 0.5 goes to the home side.
pub fn predicted_side(expected: &SideValues<f64>) -> Side {
    if expected.away > expected.home {
        Side::Away
    } else {
        Side::Home
    }
}

/// Build an unresolved prediction from expected scores
pub fn build_prediction(
    contest: &Contest,
    expected: SideValues<f64>,
    as_of_time: DateTime<Utc>,
    model_version: &str,
) -> Prediction {
    let favourite = predicted_side(&expected);
    Prediction {
        contest_id: contest.id.clone(),
        season: contest.season,
        home_competitor: contest.home_competitor.clone(),
        away_competitor: contest.away_competitor.clone(),
        predicted_winner: contest.competitor(favourite).clone(),
        home_win_probability: expected.home,
        away_win_probability: expected.away,
        as_of_time,
        model_version: model_version.to_string(),
        resolution: None,
    }
}

/// Produces predictions from the latest known ratings
#[derive(Debug, Clone)]
pub struct Forecaster {
    config: RatingConfig,
    matchup: Arc<dyn MatchupAdjustment>,
}

impl Forecaster {
    /// Create a forecaster; the matchup adjustment follows `config.head_to_head`
    pub fn new(config: RatingConfig) -> Self {
        Self {
            matchup: configured_adjustment(&config),
            config,
        }
    }

    /// Replace the matchup adjustment
    pub fn with_matchup_adjustment(mut self, matchup: Arc<dyn MatchupAdjustment>) -> Self {
        self.matchup = matchup;
        self
    }

    /// Forecast a contest that has not been played yet
    pub fn forecast(&self, contest: &Contest, ratings: &RatingMap) -> Prediction {
        self.forecast_with_history(contest, ratings, &HeadToHeadLog::default())
    }

    /// Forecast a contest, consulting prior meetings of the pair
    pub fn forecast_with_history(
        &self,
        contest: &Contest,
        ratings: &RatingMap,
        history: &HeadToHeadLog,
    ) -> Prediction {
        let home = ratings
            .get(&contest.home_competitor)
            .copied()
            .unwrap_or(self.config.initial_rating);
        let away = ratings
            .get(&contest.away_competitor)
            .copied()
            .unwrap_or(self.config.initial_rating);

        let matchup =
            self.matchup
                .adjust(&contest.home_competitor, &contest.away_competitor, history);
        let expected = expected_scores(
            home + matchup.home,
            away + matchup.away,
            self.config.home_advantage,
        );
        debug!(
            contest_id = %contest.id,
            rating_gap = rating_difference(home, away),
            matchup_home = matchup.home,
            expected_home = expected.home,
            "Forecast contest"
        );

        build_prediction(
            contest,
            expected,
            current_timestamp(),
            &self.config.model_version,
        )
    }

    /// Attach the actual outcome of `contest` to its prediction
    pub fn resolve(&self, prediction: Prediction, contest: &Contest) -> Result<Prediction> {
        if prediction.contest_id != contest.id {
            return Err(RatingError::ContestMismatch {
                expected: prediction.contest_id,
                actual: contest.id.clone(),
            }
            .into());
        }

        let actual = actual_scores(contest, self.config.tie_policy)?;
        self.resolve_with_winner(prediction, winner_of(contest, &actual))
    }

    /// Attach a known winner (`None` for a draw) to a prediction
    pub fn resolve_with_winner(
        &self,
        mut prediction: Prediction,
        actual_winner: Option<CompetitorId>,
    ) -> Result<Prediction> {
        if prediction.is_resolved() {
            return Err(RatingError::AlreadyResolved {
                contest_id: prediction.contest_id,
            }
            .into());
        }

        prediction.resolution = Some(PredictionResolution {
            correct: actual_winner.as_ref() == Some(&prediction.predicted_winner),
            actual_winner,
            resolved_at: current_timestamp(),
        });

        Ok(prediction)
    }
}
