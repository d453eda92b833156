//! Game outcome processing
//!
//! Applies a single completed contest to a rating snapshot and produces the
//! rating change record and the (already resolved) pre-game prediction.

use crate::config::{RatingConfig, TiePolicy};
use crate::error::{RatingError, Result};
use crate::prediction::forecast::{build_prediction, predicted_side};
use crate::rating::expected::expected_scores;
use crate::rating::k_factor::KFactorPolicy;
use crate::rating::matchup::{configured_adjustment, HeadToHeadLog, MatchupAdjustment};
use crate::types::{
    CompetitorId, CompletionState, Contest, Prediction, PredictionResolution, RatingChangeRecord,
    RatingMap, Side, SideValues,
};
use crate::utils::{current_timestamp, margin_of_victory};
use std::sync::Arc;
use tracing::debug;

/// Validated final score of a completed contest
pub fn final_scores(contest: &Contest) -> Result<(u32, u32)> {
    if contest.completion_state != CompletionState::Completed {
        return Err(RatingError::MalformedContest {
            contest_id: contest.id.clone(),
            reason: format!("contest is {:?}, not completed", contest.completion_state),
        }
        .into());
    }

    if contest.home_competitor == contest.away_competitor {
        return Err(RatingError::MalformedContest {
            contest_id: contest.id.clone(),
            reason: format!("{} is listed on both sides", contest.home_competitor),
        }
        .into());
    }

    match (contest.home_score, contest.away_score) {
        (Some(home), Some(away)) => Ok((home, away)),
        _ => Err(RatingError::MalformedContest {
            contest_id: contest.id.clone(),
            reason: "missing final score".to_string(),
        }
        .into()),
    }
}

/// Actual scores (1 for a win, 0 for a loss) for a completed contest
pub fn actual_scores(contest: &Contest, tie_policy: TiePolicy) -> Result<SideValues<f64>> {
    let (home, away) = final_scores(contest)?;

    if home == away {
        return match tie_policy {
            TiePolicy::Reject => Err(RatingError::TiedContest {
                contest_id: contest.id.clone(),
            }
            .into()),
            TiePolicy::HalfPoint => Ok(SideValues::new(0.5, 0.5)),
        };
    }

    let home_actual = if home > away { 1.0 } else { 0.0 };
    Ok(SideValues::new(home_actual, 1.0 - home_actual))
}

/// Winner implied by actual scores; `None` for a half-point draw
pub fn winner_of(contest: &Contest, actual: &SideValues<f64>) -> Option<CompetitorId> {
    if actual.home > actual.away {
        Some(contest.home_competitor.clone())
    } else if actual.away > actual.home {
        Some(contest.away_competitor.clone())
    } else {
        None
    }
}

/// Result of applying one contest
#[derive(Debug, Clone)]
pub struct GameOutcome {
    pub rating_change: RatingChangeRecord,
    pub prediction: Prediction,
}

impl GameOutcome {
    /// Replace both sides' ratings in place
    pub fn commit(&self, ratings: &mut RatingMap) {
        let change = &self.rating_change;
        ratings.insert(change.home_competitor.clone(), change.rating_after.home);
        ratings.insert(change.away_competitor.clone(), change.rating_after.away);
    }

    /// Copy of `ratings` with both sides replaced
    pub fn updated_ratings(&self, ratings: &RatingMap) -> RatingMap {
        let mut updated = ratings.clone();
        self.commit(&mut updated);
        updated
    }

    pub fn winner(&self) -> Option<&CompetitorId> {
        self.prediction
            .resolution
            .as_ref()
            .and_then(|resolution| resolution.actual_winner.as_ref())
    }
}

/// Applies contest results to rating snapshots
#[derive(Debug, Clone)]
pub struct GameOutcomeProcessor {
    config: RatingConfig,
    k_policy: KFactorPolicy,
    matchup: Arc<dyn MatchupAdjustment>,
}

impl GameOutcomeProcessor {
    /// Create a processor; the matchup adjustment follows `config.head_to_head`
    pub fn new(config: RatingConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            k_policy: KFactorPolicy::from(&config),
            matchup: configured_adjustment(&config),
            config,
        })
    }

    /// Replace the matchup adjustment
    pub fn with_matchup_adjustment(mut self, matchup: Arc<dyn MatchupAdjustment>) -> Self {
        self.matchup = matchup;
        self
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    pub fn k_policy(&self) -> &KFactorPolicy {
        &self.k_policy
    }

    pub fn matchup_adjustment(&self) -> Arc<dyn MatchupAdjustment> {
        self.matchup.clone()
    }

    /// Rating of a competitor, defaulting to the initial rating when unknown
    pub fn rating_of(&self, ratings: &RatingMap, competitor_id: &str) -> f64 {
        ratings
            .get(competitor_id)
            .copied()
            .unwrap_or(self.config.initial_rating)
    }

    /// Apply a completed contest to `ratings` without matchup history
    pub fn apply_result(&self, contest: &Contest, ratings: &RatingMap) -> Result<GameOutcome> {
        self.apply_result_with_history(contest, ratings, &HeadToHeadLog::default())
    }

    /// Apply a completed contest to `ratings`, consulting prior meetings
    pub fn apply_result_with_history(
        &self,
        contest: &Contest,
        ratings: &RatingMap,
        history: &HeadToHeadLog,
    ) -> Result<GameOutcome> {
        let actual = actual_scores(contest, self.config.tie_policy)?;
        let (home_score, away_score) = final_scores(contest)?;

        let before = SideValues::new(
            self.rating_of(ratings, &contest.home_competitor),
            self.rating_of(ratings, &contest.away_competitor),
        );

        let matchup =
            self.matchup
                .adjust(&contest.home_competitor, &contest.away_competitor, history);
        let expected = expected_scores(
            before.home + matchup.home,
            before.away + matchup.away,
            self.config.home_advantage,
        );

        let margin = margin_of_victory(home_score, away_score);
        let k = self.k_policy.for_margin(margin);

        let delta = SideValues::new(
            k.get(Side::Home) * (actual.home - expected.home),
            k.get(Side::Away) * (actual.away - expected.away),
        );
        let after = SideValues::new(before.home + delta.home, before.away + delta.away);

        debug!(
            contest_id = %contest.id,
            home = %contest.home_competitor,
            away = %contest.away_competitor,
            favourite = %predicted_side(&expected),
            expected_home = expected.home,
            delta_home = delta.home,
            delta_away = delta.away,
            "Applied contest result"
        );

        let now = current_timestamp();
        let mut prediction = build_prediction(
            contest,
            expected,
            contest.start_time,
            &self.config.model_version,
        );
        let actual_winner = winner_of(contest, &actual);
        prediction.resolution = Some(PredictionResolution {
            correct: actual_winner.as_ref() == Some(&prediction.predicted_winner),
            actual_winner,
            resolved_at: now,
        });

        let rating_change = RatingChangeRecord {
            contest_id: contest.id.clone(),
            season: contest.season,
            home_competitor: contest.home_competitor.clone(),
            away_competitor: contest.away_competitor.clone(),
            rating_before: before,
            rating_after: after,
            delta,
            k_factor_used: k,
            home_advantage_used: self.config.home_advantage,
            matchup_adjustment: matchup,
            expected,
            actual,
            model_version: self.config.model_version.clone(),
            recorded_at: now,
        };

        Ok(GameOutcome {
            rating_change,
            prediction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeadToHeadConfig;
    use crate::types::ContestKind;
    use chrono::{TimeZone, Utc};

    fn contest(id: &str, home: &str, away: &str, home_score: u32, away_score: u32) -> Contest {
        Contest {
            id: id.to_string(),
            season: 2023,
            start_time: Utc.with_ymd_and_hms(2023, 9, 10, 18, 0, 0).unwrap(),
            home_competitor: home.to_string(),
            away_competitor: away.to_string(),
            home_score: Some(home_score),
            away_score: Some(away_score),
            completion_state: CompletionState::Completed,
            contest_kind: ContestKind::RegularSeason,
        }
    }

    fn neutral_processor() -> GameOutcomeProcessor {
        GameOutcomeProcessor::new(RatingConfig::neutral()).unwrap()
    }

    #[test]
    fn test_home_win_by_one_from_even() {
        let processor = neutral_processor();
        let outcome = processor
            .apply_result(&contest("g1", "hawks", "owls", 21, 20), &RatingMap::new())
            .unwrap();
        let change = &outcome.rating_change;

        assert_eq!(change.rating_before.home, 1500.0);
        assert_eq!(change.expected.home, 0.5);
        assert_eq!(change.actual.home, 1.0);
        assert_eq!(change.actual.away, 0.0);
        assert!((change.k_factor_used.home - 35.2).abs() < 1e-9);
        assert!((change.delta.home - 17.6).abs() < 1e-9);
        assert!((change.rating_after.home - 1517.6).abs() < 1e-9);
        assert!((change.rating_after.away - 1482.4).abs() < 1e-9);
        assert_eq!(change.home_advantage_used, 0.0);
    }

    #[test]
    fn test_deltas_diverge_with_asymmetric_sensitivity() {
        let config = RatingConfig {
            home_advantage: 0.0,
            ..RatingConfig::default()
        };
        let processor = GameOutcomeProcessor::new(config).unwrap();
        let outcome = processor
            .apply_result(&contest("g1", "hawks", "owls", 30, 20), &RatingMap::new())
            .unwrap();
        let delta = outcome.rating_change.delta;

        // home K = 32 * 2.0, away K = 32 * 2.8
        assert!((delta.home - 32.0).abs() < 1e-9);
        assert!((delta.away + 44.8).abs() < 1e-9);
        assert!((delta.home + delta.away).abs() > 1.0);
    }

    #[test]
    fn test_existing_ratings_are_used() {
        let processor = neutral_processor();
        let mut ratings = RatingMap::new();
        ratings.insert("hawks".to_string(), 1600.0);

        let outcome = processor
            .apply_result(&contest("g1", "hawks", "owls", 10, 13), &ratings)
            .unwrap();
        let change = &outcome.rating_change;

        assert_eq!(change.rating_before.home, 1600.0);
        assert_eq!(change.rating_before.away, 1500.0);
        assert!(change.delta.home < 0.0);
        assert!(change.delta.away > 0.0);
    }

    #[test]
    fn test_commit_and_updated_ratings() {
        let processor = neutral_processor();
        let ratings = RatingMap::new();
        let outcome = processor
            .apply_result(&contest("g1", "hawks", "owls", 21, 20), &ratings)
            .unwrap();

        let updated = outcome.updated_ratings(&ratings);
        assert!(ratings.is_empty());
        assert!((updated["hawks"] - 1517.6).abs() < 1e-9);
        assert!((updated["owls"] - 1482.4).abs() < 1e-9);
    }

    #[test]
    fn test_prediction_is_resolved() {
        let processor = GameOutcomeProcessor::new(RatingConfig::default()).unwrap();
        let outcome = processor
            .apply_result(&contest("g1", "hawks", "owls", 7, 14), &RatingMap::new())
            .unwrap();
        let prediction = &outcome.prediction;

        // Home advantage makes the home side the favourite
        assert_eq!(prediction.predicted_winner, "hawks");
        assert_eq!(prediction.model_version, "elo-v1");
        let resolution = prediction.resolution.as_ref().unwrap();
        assert_eq!(resolution.actual_winner.as_deref(), Some("owls"));
        assert!(!resolution.correct);
        assert_eq!(outcome.winner().map(String::as_str), Some("owls"));
    }

    #[test]
    fn test_tie_is_rejected_by_default() {
        let processor = neutral_processor();
        let err = processor
            .apply_result(&contest("g1", "hawks", "owls", 17, 17), &RatingMap::new())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RatingError>(),
            Some(RatingError::TiedContest { .. })
        ));
    }

    #[test]
    fn test_tie_half_point_policy() {
        let config = RatingConfig {
            tie_policy: TiePolicy::HalfPoint,
            ..RatingConfig::neutral()
        };
        let processor = GameOutcomeProcessor::new(config).unwrap();
        let outcome = processor
            .apply_result(&contest("g1", "hawks", "owls", 17, 17), &RatingMap::new())
            .unwrap();

        assert_eq!(outcome.rating_change.delta.home, 0.0);
        assert_eq!(outcome.rating_change.delta.away, 0.0);
        assert!(outcome.winner().is_none());
        assert!(!outcome.prediction.resolution.unwrap().correct);
    }

    #[test]
    fn test_malformed_contests() {
        let processor = neutral_processor();

        let mut missing_score = contest("g1", "hawks", "owls", 1, 0);
        missing_score.away_score = None;
        let mut same_side = contest("g2", "hawks", "hawks", 1, 0);
        same_side.away_competitor = "hawks".to_string();
        let mut scheduled = contest("g3", "hawks", "owls", 1, 0);
        scheduled.completion_state = CompletionState::Scheduled;

        for bad in [missing_score, same_side, scheduled] {
            let err = processor.apply_result(&bad, &RatingMap::new()).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<RatingError>(),
                Some(RatingError::MalformedContest { .. })
            ));
        }
    }

    #[test]
    fn test_head_to_head_shifts_expectation() {
        let config = RatingConfig {
            head_to_head: Some(HeadToHeadConfig::default()),
            ..RatingConfig::neutral()
        };
        let processor = GameOutcomeProcessor::new(config).unwrap();

        let mut history = HeadToHeadLog::new();
        history.record("hawks", "owls", Some("hawks".to_string()));
        history.record("owls", "hawks", Some("hawks".to_string()));

        let outcome = processor
            .apply_result_with_history(
                &contest("g3", "hawks", "owls", 21, 20),
                &RatingMap::new(),
                &history,
            )
            .unwrap();
        let change = &outcome.rating_change;

        assert_eq!(change.matchup_adjustment.home, 6.0);
        assert_eq!(change.matchup_adjustment.away, -6.0);
        assert!(change.expected.home > 0.5);
        // Stored ratings are not shifted by the adjustment
        assert_eq!(change.rating_before.home, 1500.0);
    }
}
