//! Common types used throughout the rating engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique identifier for competitors (teams, players)
pub type CompetitorId = String;

/// Unique identifier for contests
pub type ContestId = String;

/// Season identifier (the season's starting year)
pub type SeasonId = i32;

/// Working rating state threaded through a season fold
pub type RatingMap = HashMap<CompetitorId, f64>;

/// Which side of a contest a competitor is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Home => write!(f, "home"),
            Side::Away => write!(f, "away"),
        }
    }
}

/// A pair of values, one per side of a contest
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SideValues<T> {
    pub home: T,
    pub away: T,
}

impl<T: Copy> SideValues<T> {
    pub fn new(home: T, away: T) -> Self {
        Self { home, away }
    }

    pub fn get(&self, side: Side) -> T {
        match side {
            Side::Home => self.home,
            Side::Away => self.away,
        }
    }
}

/// Kind of contest within a season
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContestKind {
    Preseason,
    RegularSeason,
    Postseason,
}

/// Completion state reported by the schedule source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionState {
    Scheduled,
    InProgress,
    Completed,
    Postponed,
    Cancelled,
}

/// A head-to-head contest as delivered by the schedule source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contest {
    pub id: ContestId,
    pub season: SeasonId,
    pub start_time: DateTime<Utc>,
    pub home_competitor: CompetitorId,
    pub away_competitor: CompetitorId,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub completion_state: CompletionState,
    pub contest_kind: ContestKind,
}

impl Contest {
    /// Whether this contest takes part in rating updates
    pub fn is_rateable(&self) -> bool {
        self.contest_kind == ContestKind::RegularSeason
            && self.completion_state == CompletionState::Completed
    }

    pub fn involves(&self, competitor_id: &str) -> bool {
        self.home_competitor == competitor_id || self.away_competitor == competitor_id
    }

    pub fn competitor(&self, side: Side) -> &CompetitorId {
        match side {
            Side::Home => &self.home_competitor,
            Side::Away => &self.away_competitor,
        }
    }
}

/// Persisted rating for a competitor at the end of a season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorRating {
    pub competitor_id: CompetitorId,
    pub rating: f64,
    pub as_of_season: SeasonId,
    pub contests_played: u32,
}

/// Audit record of one rating update. Unique per contest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingChangeRecord {
    pub contest_id: ContestId,
    pub season: SeasonId,
    pub home_competitor: CompetitorId,
    pub away_competitor: CompetitorId,
    pub rating_before: SideValues<f64>,
    pub rating_after: SideValues<f64>,
    pub delta: SideValues<f64>,
    pub k_factor_used: SideValues<f64>,
    pub home_advantage_used: f64,
    pub matchup_adjustment: SideValues<f64>,
    pub expected: SideValues<f64>,
    pub actual: SideValues<f64>,
    pub model_version: String,
    pub recorded_at: DateTime<Utc>,
}

/// Outcome attached to a prediction once its contest completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResolution {
    /// `None` only when a draw was rated as a half point
    pub actual_winner: Option<CompetitorId>,
    pub correct: bool,
    pub resolved_at: DateTime<Utc>,
}

/// Pre-game forecast for a contest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub contest_id: ContestId,
    pub season: SeasonId,
    pub home_competitor: CompetitorId,
    pub away_competitor: CompetitorId,
    pub predicted_winner: CompetitorId,
    pub home_win_probability: f64,
    pub away_win_probability: f64,
    pub as_of_time: DateTime<Utc>,
    pub model_version: String,
    pub resolution: Option<PredictionResolution>,
}

impl Prediction {
    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    /// Probability assigned to the predicted winner
    pub fn confidence(&self) -> f64 {
        self.home_win_probability.max(self.away_win_probability)
    }
}

/// A resolved contest whose actual winner differs from the predicted one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upset {
    pub contest_id: ContestId,
    pub predicted_winner: CompetitorId,
    pub actual_winner: CompetitorId,
}
