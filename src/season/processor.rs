//! Chronological season processing
//!
//! Gathers a season's regular-season contests, removes duplicates, orders
//! them by start time and folds them one at a time through the game outcome
//! processor. Each contest sees exactly the ratings produced by the contests
//! before it, so the fold is strictly sequential.

use crate::error::{RatingError, Result};
use crate::metrics::MetricsCollector;
use crate::rating::matchup::HeadToHeadLog;
use crate::rating::processor::GameOutcomeProcessor;
use crate::season::fetch::{gather_contests, ContestFetcher, FetchFailurePolicy};
use crate::types::{
    CompetitorId, CompletionState, Contest, ContestId, ContestKind, Prediction,
    RatingChangeRecord, RatingMap, SeasonId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A contest left out of the fold, with the reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedContest {
    pub contest_id: ContestId,
    /// Short machine-readable label (`malformed`, `tied`, ...)
    pub kind: String,
    pub reason: String,
}

/// Everything produced by one season fold
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeasonOutcome {
    pub season: SeasonId,
    pub rating_changes: Vec<RatingChangeRecord>,
    pub predictions: Vec<Prediction>,
    /// Ratings of every competitor that took part in a scored contest
    pub final_ratings: RatingMap,
    pub skipped: Vec<SkippedContest>,
    /// Regular-season contests not yet played, in start order
    pub pending: Vec<Contest>,
    /// Meetings so far, including every scored contest of this season
    #[serde(skip)]
    pub history: HeadToHeadLog,
}

impl SeasonOutcome {
    pub fn contests_scored(&self) -> usize {
        self.rating_changes.len()
    }
}

/// Deduplicate by contest id (first occurrence wins) and stable-sort by start time
pub fn order_contests(contests: Vec<Contest>) -> Vec<Contest> {
    let mut seen: HashSet<ContestId> = HashSet::new();
    let mut ordered: Vec<Contest> = contests
        .into_iter()
        .filter(|contest| seen.insert(contest.id.clone()))
        .collect();

    ordered.sort_by_key(|contest| contest.start_time);
    ordered
}

/// Folds a season's contests into ratings
pub struct SeasonProcessor {
    fetcher: Arc<dyn ContestFetcher>,
    outcome_processor: GameOutcomeProcessor,
    fetch_concurrency: usize,
    fetch_policy: FetchFailurePolicy,
    metrics: Option<Arc<MetricsCollector>>,
}

impl SeasonProcessor {
    pub fn new(fetcher: Arc<dyn ContestFetcher>, outcome_processor: GameOutcomeProcessor) -> Self {
        Self {
            fetcher,
            outcome_processor,
            fetch_concurrency: 8,
            fetch_policy: FetchFailurePolicy::default(),
            metrics: None,
        }
    }

    pub fn with_fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.fetch_concurrency = concurrency.max(1);
        self
    }

    pub fn with_fetch_policy(mut self, policy: FetchFailurePolicy) -> Self {
        self.fetch_policy = policy;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn outcome_processor(&self) -> &GameOutcomeProcessor {
        &self.outcome_processor
    }

    /// Fetch and fold one season with no prior meetings
    pub async fn process_season(
        &self,
        season: SeasonId,
        competitors: &[CompetitorId],
        initial_ratings: RatingMap,
    ) -> Result<SeasonOutcome> {
        self.process_season_with_history(season, competitors, initial_ratings, HeadToHeadLog::new())
            .await
    }

    /// Fetch and fold one season, continuing the meeting log of earlier seasons
    pub async fn process_season_with_history(
        &self,
        season: SeasonId,
        competitors: &[CompetitorId],
        initial_ratings: RatingMap,
        history: HeadToHeadLog,
    ) -> Result<SeasonOutcome> {
        let fetched = gather_contests(
            self.fetcher.as_ref(),
            competitors,
            season,
            self.fetch_concurrency,
            self.fetch_policy,
        )
        .await?;

        let regular_season: Vec<Contest> = fetched
            .into_iter()
            .filter(|contest| contest.contest_kind == ContestKind::RegularSeason)
            .collect();

        debug!(
            season,
            competitors = competitors.len(),
            contests = regular_season.len(),
            "Gathered season contests"
        );

        Ok(self.process_contests_with_history(season, regular_season, initial_ratings, history))
    }

    /// Fold an already gathered contest list
    ///
    /// Contests that fail to apply are logged and skipped; the rest of the
    /// season still runs.
    pub fn process_contests(
        &self,
        season: SeasonId,
        contests: Vec<Contest>,
        initial_ratings: RatingMap,
    ) -> SeasonOutcome {
        self.process_contests_with_history(season, contests, initial_ratings, HeadToHeadLog::new())
    }

    /// Fold an already gathered contest list on top of an existing meeting log
    pub fn process_contests_with_history(
        &self,
        season: SeasonId,
        contests: Vec<Contest>,
        initial_ratings: RatingMap,
        history: HeadToHeadLog,
    ) -> SeasonOutcome {
        let mut ratings = initial_ratings;
        let mut history = history;
        let mut participants: HashSet<CompetitorId> = HashSet::new();
        let mut outcome = SeasonOutcome {
            season,
            ..SeasonOutcome::default()
        };

        for contest in order_contests(contests) {
            if contest.contest_kind != ContestKind::RegularSeason {
                continue;
            }

            match contest.completion_state {
                CompletionState::Completed => {}
                CompletionState::Cancelled => {
                    debug!(contest_id = %contest.id, "Ignoring cancelled contest");
                    continue;
                }
                _ => {
                    outcome.pending.push(contest);
                    continue;
                }
            }

            match self
                .outcome_processor
                .apply_result_with_history(&contest, &ratings, &history)
            {
                Ok(game) => {
                    game.commit(&mut ratings);
                    history.record(
                        &contest.home_competitor,
                        &contest.away_competitor,
                        game.winner().cloned(),
                    );
                    participants.insert(contest.home_competitor.clone());
                    participants.insert(contest.away_competitor.clone());

                    outcome.rating_changes.push(game.rating_change);
                    outcome.predictions.push(game.prediction);

                    if let Some(metrics) = &self.metrics {
                        metrics.record_contest_scored();
                    }
                }
                Err(e) => {
                    let kind = e
                        .downcast_ref::<RatingError>()
                        .map(RatingError::kind)
                        .unwrap_or("error");
                    warn!(contest_id = %contest.id, season, "Skipping contest: {}", e);

                    if let Some(metrics) = &self.metrics {
                        metrics.record_contest_skipped(kind);
                    }
                    outcome.skipped.push(SkippedContest {
                        contest_id: contest.id.clone(),
                        kind: kind.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        outcome.final_ratings = ratings
            .into_iter()
            .filter(|(competitor_id, _)| participants.contains(competitor_id))
            .collect();
        outcome.history = history;

        info!(
            season,
            scored = outcome.contests_scored(),
            skipped = outcome.skipped.len(),
            pending = outcome.pending.len(),
            "Season fold complete"
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HeadToHeadConfig, RatingConfig};
    use crate::season::fetch::{MockContestFetcher, StaticContestFetcher};
    use chrono::{Duration, TimeZone, Utc};

    fn contest(id: &str, day: i64, home: &str, away: &str, score: (u32, u32)) -> Contest {
        Contest {
            id: id.to_string(),
            season: 2023,
            start_time: Utc.with_ymd_and_hms(2023, 9, 1, 18, 0, 0).unwrap() + Duration::days(day),
            home_competitor: home.to_string(),
            away_competitor: away.to_string(),
            home_score: Some(score.0),
            away_score: Some(score.1),
            completion_state: CompletionState::Completed,
            contest_kind: ContestKind::RegularSeason,
        }
    }

    fn processor_with(contests: Vec<Contest>) -> SeasonProcessor {
        SeasonProcessor::new(
            Arc::new(StaticContestFetcher::new(contests)),
            GameOutcomeProcessor::new(RatingConfig::neutral()).unwrap(),
        )
    }

    fn teams(names: &[&str]) -> Vec<CompetitorId> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_order_contests_dedups_and_sorts_stably() {
        let ordered = order_contests(vec![
            contest("late", 5, "a", "b", (1, 0)),
            contest("tie_1", 2, "a", "c", (1, 0)),
            contest("late", 5, "a", "b", (1, 0)),
            contest("tie_2", 2, "b", "c", (1, 0)),
            contest("early", 0, "b", "a", (1, 0)),
        ]);
        let ids: Vec<_> = ordered.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "tie_1", "tie_2", "late"]);
    }

    #[tokio::test]
    async fn test_contest_seen_from_both_schedules_is_scored_once() {
        let processor = processor_with(vec![contest("g1", 0, "a", "b", (3, 1))]);

        let outcome = processor
            .process_season(2023, &teams(&["a", "b"]), RatingMap::new())
            .await
            .unwrap();

        assert_eq!(outcome.contests_scored(), 1);
        assert_eq!(outcome.predictions.len(), 1);
        assert_eq!(outcome.final_ratings.len(), 2);
    }

    #[tokio::test]
    async fn test_non_regular_season_contests_are_ignored() {
        let mut playoff = contest("p1", 10, "a", "b", (3, 1));
        playoff.contest_kind = ContestKind::Postseason;
        let mut exhibition = contest("x1", -10, "a", "b", (0, 9));
        exhibition.contest_kind = ContestKind::Preseason;

        let processor = processor_with(vec![contest("g1", 0, "a", "b", (3, 1)), playoff, exhibition]);
        let outcome = processor
            .process_season(2023, &teams(&["a", "b"]), RatingMap::new())
            .await
            .unwrap();

        assert_eq!(outcome.contests_scored(), 1);
        assert_eq!(outcome.rating_changes[0].contest_id, "g1");
    }

    #[test]
    fn test_fold_threads_ratings_forward() {
        let processor = processor_with(vec![]);
        let outcome = processor.process_contests(
            2023,
            vec![
                contest("g2", 1, "a", "c", (2, 1)),
                contest("g1", 0, "a", "b", (2, 1)),
            ],
            RatingMap::new(),
        );

        assert_eq!(outcome.rating_changes[0].contest_id, "g1");
        let second = &outcome.rating_changes[1];
        assert_eq!(second.contest_id, "g2");
        assert_eq!(second.rating_before.home, outcome.rating_changes[0].rating_after.home);
        assert_eq!(outcome.final_ratings["a"], second.rating_after.home);
    }

    #[test]
    fn test_bad_contests_are_skipped_not_fatal() {
        let mut missing = contest("bad", 1, "a", "b", (0, 0));
        missing.home_score = None;

        let processor = processor_with(vec![]);
        let outcome = processor.process_contests(
            2023,
            vec![
                contest("g1", 0, "a", "b", (2, 1)),
                missing,
                contest("tie", 2, "a", "b", (1, 1)),
                contest("g2", 3, "b", "a", (2, 1)),
            ],
            RatingMap::new(),
        );

        assert_eq!(outcome.contests_scored(), 2);
        assert_eq!(outcome.skipped.len(), 2);
        assert_eq!(outcome.skipped[0].contest_id, "bad");
        assert_eq!(outcome.skipped[0].kind, "malformed");
        assert_eq!(outcome.skipped[1].kind, "tied");
    }

    #[test]
    fn test_unplayed_contests_become_pending() {
        let mut upcoming = contest("next", 7, "a", "b", (0, 0));
        upcoming.home_score = None;
        upcoming.away_score = None;
        upcoming.completion_state = CompletionState::Scheduled;
        let mut cancelled = contest("off", 8, "a", "b", (0, 0));
        cancelled.completion_state = CompletionState::Cancelled;

        let processor = processor_with(vec![]);
        let outcome = processor.process_contests(
            2023,
            vec![upcoming, contest("g1", 0, "a", "b", (2, 1)), cancelled],
            RatingMap::new(),
        );

        assert_eq!(outcome.contests_scored(), 1);
        assert_eq!(outcome.pending.len(), 1);
        assert_eq!(outcome.pending[0].id, "next");
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_final_ratings_only_cover_participants() {
        let mut initial = RatingMap::new();
        initial.insert("idle".to_string(), 1620.0);
        initial.insert("a".to_string(), 1550.0);

        let processor = processor_with(vec![]);
        let outcome = processor.process_contests(
            2023,
            vec![contest("g1", 0, "a", "b", (2, 1))],
            initial,
        );

        assert_eq!(outcome.rating_changes[0].rating_before.home, 1550.0);
        assert!(outcome.final_ratings.contains_key("a"));
        assert!(outcome.final_ratings.contains_key("b"));
        assert!(!outcome.final_ratings.contains_key("idle"));
    }

    #[test]
    fn test_meeting_log_continues_across_calls() {
        let config = RatingConfig {
            head_to_head: Some(HeadToHeadConfig::default()),
            ..RatingConfig::neutral()
        };
        let processor = SeasonProcessor::new(
            Arc::new(StaticContestFetcher::default()),
            GameOutcomeProcessor::new(config).unwrap(),
        );

        let first = processor.process_contests(
            2023,
            vec![contest("g1", 0, "a", "b", (2, 1))],
            RatingMap::new(),
        );
        assert_eq!(first.history.meeting_count("a", "b"), 1);

        let mut rematch = contest("g2", 0, "b", "a", (1, 2));
        rematch.season = 2024;
        let second = processor.process_contests_with_history(
            2024,
            vec![rematch],
            first.final_ratings.clone(),
            first.history.clone(),
        );

        // a won the earlier meeting and is the away side here
        assert_eq!(second.rating_changes[0].matchup_adjustment.away, 3.0);
        assert_eq!(second.history.meeting_count("b", "a"), 2);
    }

    #[test]
    fn test_metrics_are_recorded() {
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let processor = processor_with(vec![]).with_metrics(metrics.clone());

        processor.process_contests(
            2023,
            vec![
                contest("g1", 0, "a", "b", (2, 1)),
                contest("tie", 1, "a", "b", (1, 1)),
            ],
            RatingMap::new(),
        );

        assert_eq!(metrics.contest().contests_scored_total.get(), 1);
        assert_eq!(
            metrics
                .contest()
                .contests_skipped_total
                .with_label_values(&["tied"])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn test_abort_policy_fails_season() {
        let mut fetcher = MockContestFetcher::new();
        fetcher
            .expect_fetch_contests()
            .returning(|_, _| Err(anyhow::anyhow!("connection refused")));

        let processor = SeasonProcessor::new(
            Arc::new(fetcher),
            GameOutcomeProcessor::new(RatingConfig::neutral()).unwrap(),
        )
        .with_fetch_policy(FetchFailurePolicy::Abort);

        let result = processor
            .process_season(2023, &teams(&["a"]), RatingMap::new())
            .await;
        assert!(result.is_err());
    }
}
