//! Test fixtures and mock implementations for integration testing

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use rating_ledger::error::Result;
use rating_ledger::season::ContestFetcher;
use rating_ledger::types::{CompetitorId, CompletionState, Contest, ContestKind, SeasonId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Contest data shared by several tests
pub const SAMPLE_CONTESTS: &str = include_str!("contests.json");

pub fn sample_contests() -> Vec<Contest> {
    serde_json::from_str(SAMPLE_CONTESTS).expect("fixture contests should parse")
}

/// Builder for contests; defaults to a completed regular-season contest
#[derive(Debug, Clone)]
pub struct ContestBuilder {
    contest: Contest,
}

impl ContestBuilder {
    pub fn new(id: &str, season: SeasonId, home: &str, away: &str) -> Self {
        Self {
            contest: Contest {
                id: id.to_string(),
                season,
                start_time: Utc.with_ymd_and_hms(season, 9, 1, 19, 0, 0).unwrap(),
                home_competitor: home.to_string(),
                away_competitor: away.to_string(),
                home_score: Some(1),
                away_score: Some(0),
                completion_state: CompletionState::Completed,
                contest_kind: ContestKind::RegularSeason,
            },
        }
    }

    pub fn day(mut self, day: i64) -> Self {
        self.contest.start_time =
            Utc.with_ymd_and_hms(self.contest.season, 9, 1, 19, 0, 0).unwrap() + Duration::days(day);
        self
    }

    pub fn score(mut self, home: u32, away: u32) -> Self {
        self.contest.home_score = Some(home);
        self.contest.away_score = Some(away);
        self.contest.completion_state = CompletionState::Completed;
        self
    }

    pub fn scheduled(mut self) -> Self {
        self.contest.home_score = None;
        self.contest.away_score = None;
        self.contest.completion_state = CompletionState::Scheduled;
        self
    }

    pub fn kind(mut self, kind: ContestKind) -> Self {
        self.contest.contest_kind = kind;
        self
    }

    pub fn build(self) -> Contest {
        self.contest
    }
}

pub fn competitors(names: &[&str]) -> Vec<CompetitorId> {
    names.iter().map(|name| name.to_string()).collect()
}

/// Fetcher that serves fixed contests, can fail whole seasons and returns
/// each competitor's schedule in reverse order
#[derive(Debug, Default)]
pub struct ScriptedContestFetcher {
    contests: Vec<Contest>,
    failing_seasons: HashSet<SeasonId>,
    calls: AtomicUsize,
    requested: Mutex<Vec<(CompetitorId, SeasonId)>>,
}

impl ScriptedContestFetcher {
    pub fn new(contests: Vec<Contest>) -> Self {
        Self {
            contests,
            ..Self::default()
        }
    }

    pub fn fail_season(mut self, season: SeasonId) -> Self {
        self.failing_seasons.insert(season);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<(CompetitorId, SeasonId)> {
        self.requested
            .lock()
            .map(|requested| requested.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ContestFetcher for ScriptedContestFetcher {
    async fn fetch_contests(
        &self,
        competitor_id: &CompetitorId,
        season: SeasonId,
    ) -> Result<Vec<Contest>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push((competitor_id.clone(), season));
        }

        if self.failing_seasons.contains(&season) {
            return Err(anyhow::anyhow!("schedule source unavailable for {}", season));
        }

        Ok(self
            .contests
            .iter()
            .rev()
            .filter(|contest| contest.season == season && contest.involves(competitor_id))
            .cloned()
            .collect())
    }
}
