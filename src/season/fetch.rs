//! Contest fetching interface and implementations
//!
//! Schedules are fetched per competitor, concurrently, and merged only once
//! every fetch has completed.

use crate::error::{RatingError, Result};
use crate::types::{CompetitorId, Contest, SeasonId};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// What to do when a competitor's schedule cannot be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FetchFailurePolicy {
    /// Log and continue as if the competitor had no contests
    #[default]
    TreatAsEmpty,
    /// Fail the whole season
    Abort,
}

/// Trait for fetching a competitor's contests in a season
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContestFetcher: Send + Sync {
    /// Contests the competitor took part in during `season`, in any order
    async fn fetch_contests(
        &self,
        competitor_id: &CompetitorId,
        season: SeasonId,
    ) -> Result<Vec<Contest>>;
}

/// Fetcher serving a fixed, in-memory list of contests
#[derive(Debug, Clone, Default)]
pub struct StaticContestFetcher {
    contests: Vec<Contest>,
}

impl StaticContestFetcher {
    pub fn new(contests: Vec<Contest>) -> Self {
        Self { contests }
    }

    pub fn contests(&self) -> &[Contest] {
        &self.contests
    }

    /// Every competitor appearing in any contest, sorted
    pub fn competitors(&self) -> Vec<CompetitorId> {
        let mut competitors: Vec<CompetitorId> = self
            .contests
            .iter()
            .flat_map(|c| [c.home_competitor.clone(), c.away_competitor.clone()])
            .collect();
        competitors.sort();
        competitors.dedup();
        competitors
    }

    /// Lowest and highest season present, if any
    pub fn season_range(&self) -> Option<(SeasonId, SeasonId)> {
        let min = self.contests.iter().map(|c| c.season).min()?;
        let max = self.contests.iter().map(|c| c.season).max()?;
        Some((min, max))
    }
}

#[async_trait]
impl ContestFetcher for StaticContestFetcher {
    async fn fetch_contests(
        &self,
        competitor_id: &CompetitorId,
        season: SeasonId,
    ) -> Result<Vec<Contest>> {
        Ok(self
            .contests
            .iter()
            .filter(|c| c.season == season && c.involves(competitor_id))
            .cloned()
            .collect())
    }
}

/// Fetch every competitor's contests with at most `concurrency` requests in flight
///
/// Results are concatenated in competitor order, regardless of completion order.
pub async fn gather_contests(
    fetcher: &dyn ContestFetcher,
    competitors: &[CompetitorId],
    season: SeasonId,
    concurrency: usize,
    policy: FetchFailurePolicy,
) -> Result<Vec<Contest>> {
    let results: Vec<(&CompetitorId, Result<Vec<Contest>>)> = stream::iter(competitors)
        .map(|competitor_id| async move {
            (
                competitor_id,
                fetcher.fetch_contests(competitor_id, season).await,
            )
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut contests = Vec::new();
    for (competitor_id, result) in results {
        match result {
            Ok(fetched) => {
                debug!(
                    competitor = %competitor_id,
                    season,
                    count = fetched.len(),
                    "Fetched contests"
                );
                contests.extend(fetched);
            }
            Err(e) => match policy {
                FetchFailurePolicy::TreatAsEmpty => {
                    warn!(
                        competitor = %competitor_id,
                        season,
                        "Contest fetch failed, treating as empty: {}",
                        e
                    );
                }
                FetchFailurePolicy::Abort => {
                    return Err(RatingError::FetchFailed {
                        competitor_id: competitor_id.clone(),
                        season,
                        message: e.to_string(),
                    }
                    .into());
                }
            },
        }
    }

    Ok(contests)
}
