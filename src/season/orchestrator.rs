//! Multi-season orchestration
//!
//! Runs seasons in ascending order as an explicit fold: each season starts
//! from the previous season's final ratings and meeting log, and its outputs
//! are persisted before the next one begins.

use crate::error::{RatingError, Result};
use crate::metrics::MetricsCollector;
use crate::prediction::analysis::accuracy;
use crate::prediction::forecast::Forecaster;
use crate::rating::matchup::HeadToHeadLog;
use crate::season::processor::{SeasonOutcome, SeasonProcessor};
use crate::storage::{RatingStore, RecordStore};
use crate::types::{CompetitorId, CompetitorRating, Contest, Prediction, RatingMap, SeasonId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

/// How a season run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonStatus {
    /// Folded and persisted
    Completed,
    /// Folded, but writing the results failed
    PersistFailed,
    /// The season could not be folded; ratings carried over untouched
    Failed,
}

impl SeasonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeasonStatus::Completed => "completed",
            SeasonStatus::PersistFailed => "persist_failed",
            SeasonStatus::Failed => "failed",
        }
    }
}

/// Summary of one season run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonReport {
    pub season: SeasonId,
    pub status: SeasonStatus,
    pub contests_scored: usize,
    pub contests_skipped: usize,
    pub predictions_forecast: usize,
    /// Percent of resolved predictions that were correct
    pub accuracy: Option<f64>,
    pub error: Option<String>,
}

/// Summary of a multi-season run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub seasons: Vec<SeasonReport>,
    /// Ratings carried out of the last season
    pub final_ratings: RatingMap,
}

/// State handed from one season to the next
#[derive(Debug, Clone, Default)]
pub struct CarryOver {
    pub ratings: RatingMap,
    pub history: HeadToHeadLog,
}

/// Drives the season processor across a range of seasons
pub struct SeasonOrchestrator {
    season_processor: SeasonProcessor,
    forecaster: Forecaster,
    rating_store: Arc<dyn RatingStore>,
    record_store: Arc<dyn RecordStore>,
    metrics: Option<Arc<MetricsCollector>>,
    seed_from_store: bool,
}

impl SeasonOrchestrator {
    pub fn new(
        season_processor: SeasonProcessor,
        rating_store: Arc<dyn RatingStore>,
        record_store: Arc<dyn RecordStore>,
    ) -> Self {
        let outcome_processor = season_processor.outcome_processor();
        let forecaster = Forecaster::new(outcome_processor.config().clone())
            .with_matchup_adjustment(outcome_processor.matchup_adjustment());
        Self {
            season_processor,
            forecaster,
            rating_store,
            record_store,
            metrics: None,
            seed_from_store: false,
        }
    }

    /// Start the first season from the ratings stored for the season before it
    pub fn with_seed_from_store(mut self) -> Self {
        self.seed_from_store = true;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Process every season from `start` to `end` inclusive
    pub async fn process_seasons(
        &self,
        start: SeasonId,
        end: SeasonId,
        competitors: &[CompetitorId],
    ) -> Result<RunSummary> {
        if start > end {
            return Err(RatingError::InvalidSeasonRange { start, end }.into());
        }

        info!(start, end, competitors = competitors.len(), "Processing seasons");

        let mut carried = CarryOver {
            ratings: self.seed_ratings(start, competitors)?,
            history: HeadToHeadLog::new(),
        };
        let mut seasons = Vec::new();
        for season in start..=end {
            let (report, next) = self.run_season(season, competitors, carried).await;
            seasons.push(report);
            carried = next;
        }

        Ok(RunSummary {
            seasons,
            final_ratings: carried.ratings,
        })
    }

    /// Ratings the first season starts from
    fn seed_ratings(&self, start: SeasonId, competitors: &[CompetitorId]) -> Result<RatingMap> {
        let mut ratings = RatingMap::new();
        if !self.seed_from_store {
            return Ok(ratings);
        }

        for competitor_id in competitors {
            if let Some(stored) = self.rating_store.get_rating(competitor_id, start - 1)? {
                ratings.insert(competitor_id.clone(), stored.rating);
            }
        }

        info!(season = start - 1, seeded = ratings.len(), "Seeded ratings from store");
        Ok(ratings)
    }

    /// Run one season; returns its report and the state to carry forward
    pub async fn run_season(
        &self,
        season: SeasonId,
        competitors: &[CompetitorId],
        carried: CarryOver,
    ) -> (SeasonReport, CarryOver) {
        let timer = self.metrics.as_ref().map(|m| m.start_timer());

        let outcome = match self
            .season_processor
            .process_season_with_history(
                season,
                competitors,
                carried.ratings.clone(),
                carried.history.clone(),
            )
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(season, "Season failed, carrying ratings over unchanged: {}", e);
                let report = SeasonReport {
                    season,
                    status: SeasonStatus::Failed,
                    contests_scored: 0,
                    contests_skipped: 0,
                    predictions_forecast: 0,
                    accuracy: None,
                    error: Some(e.to_string()),
                };
                self.record_season(&report, timer.map(|t| t.stop()));
                return (report, carried);
            }
        };

        // Latest known ratings: carried-in values overlaid with this season's results
        let mut latest = carried.ratings;
        latest.extend(
            outcome
                .final_ratings
                .iter()
                .map(|(id, rating)| (id.clone(), *rating)),
        );
        let forecasts: Vec<Prediction> = outcome
            .pending
            .iter()
            .map(|contest| {
                self.forecaster
                    .forecast_with_history(contest, &latest, &outcome.history)
            })
            .collect();

        let (status, error, season_accuracy) = match self.persist(&outcome, &forecasts) {
            Ok(predictions) => (SeasonStatus::Completed, None, accuracy(&predictions)),
            Err(e) => {
                error!(season, "Failed to persist season results: {}", e);
                (
                    SeasonStatus::PersistFailed,
                    Some(e.to_string()),
                    accuracy(&outcome.predictions),
                )
            }
        };

        let report = SeasonReport {
            season,
            status,
            contests_scored: outcome.contests_scored(),
            contests_skipped: outcome.skipped.len(),
            predictions_forecast: forecasts.len(),
            accuracy: season_accuracy,
            error,
        };

        if let (Some(metrics), Some(pct)) = (&self.metrics, season_accuracy) {
            metrics.record_accuracy(season, pct);
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_forecasts(forecasts.len());
        }
        self.record_season(&report, timer.map(|t| t.stop()));

        info!(
            season,
            status = report.status.as_str(),
            scored = report.contests_scored,
            skipped = report.contests_skipped,
            forecasts = report.predictions_forecast,
            "Season processed"
        );

        let next = CarryOver {
            ratings: outcome.final_ratings,
            history: outcome.history,
        };
        (report, next)
    }

    /// Resolve the stored prediction for a contest that has just completed
    pub fn resolve_contest(&self, contest: &Contest) -> Result<Prediction> {
        let prediction = self.record_store.get_prediction(&contest.id)?.ok_or_else(|| {
            RatingError::PredictionNotFound {
                contest_id: contest.id.clone(),
            }
        })?;

        let resolved = self.forecaster.resolve(prediction, contest)?;
        self.record_store.upsert_prediction(resolved.clone())?;
        Ok(resolved)
    }

    /// Write records, predictions and end-of-season ratings
    ///
    /// Returns the season's predictions as persisted.
    fn persist(&self, outcome: &SeasonOutcome, forecasts: &[Prediction]) -> Result<Vec<Prediction>> {
        for record in &outcome.rating_changes {
            self.record_store.upsert_rating_change(record.clone())?;
        }

        let mut persisted = Vec::with_capacity(outcome.predictions.len());
        for prediction in &outcome.predictions {
            let stored = match self.record_store.get_prediction(&prediction.contest_id)? {
                // An earlier forecast gets resolved instead of replaced
                Some(existing) if !existing.is_resolved() => {
                    let winner = prediction
                        .resolution
                        .as_ref()
                        .and_then(|r| r.actual_winner.clone());
                    self.forecaster.resolve_with_winner(existing, winner)?
                }
                _ => prediction.clone(),
            };
            self.record_store.upsert_prediction(stored.clone())?;
            persisted.push(stored);
        }

        for forecast in forecasts {
            match self.record_store.get_prediction(&forecast.contest_id)? {
                Some(existing) if existing.is_resolved() => {
                    warn!(
                        contest_id = %forecast.contest_id,
                        "Contest already resolved, keeping stored prediction"
                    );
                }
                _ => self.record_store.upsert_prediction(forecast.clone())?,
            }
        }

        let mut contests_played: HashMap<&str, u32> = HashMap::new();
        for record in &outcome.rating_changes {
            *contests_played.entry(record.home_competitor.as_str()).or_default() += 1;
            *contests_played.entry(record.away_competitor.as_str()).or_default() += 1;
        }

        let ratings: Vec<CompetitorRating> = outcome
            .final_ratings
            .iter()
            .map(|(competitor_id, rating)| CompetitorRating {
                competitor_id: competitor_id.clone(),
                rating: *rating,
                as_of_season: outcome.season,
                contests_played: contests_played
                    .get(competitor_id.as_str())
                    .copied()
                    .unwrap_or(0),
            })
            .collect();
        self.rating_store.store_ratings(ratings)?;

        Ok(persisted)
    }

    fn record_season(&self, report: &SeasonReport, duration: Option<std::time::Duration>) {
        if let (Some(metrics), Some(duration)) = (&self.metrics, duration) {
            metrics.record_season(report.status.as_str(), duration);
        }
    }
}
