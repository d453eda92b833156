//! Pluggable matchup adjustments
//!
//! A matchup adjustment shifts the effective ratings used for the expected
//! score of a single contest, based on prior meetings of the same pair. It
//! never changes stored ratings.

use crate::config::{HeadToHeadConfig, RatingConfig};
use crate::types::{CompetitorId, SideValues};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Results of prior meetings, keyed by unordered competitor pair
#[derive(Debug, Clone, Default)]
pub struct HeadToHeadLog {
    meetings: HashMap<(CompetitorId, CompetitorId), Vec<Option<CompetitorId>>>,
}

fn pair_key(a: &str, b: &str) -> (CompetitorId, CompetitorId) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl HeadToHeadLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a meeting; `winner` is `None` for a draw
    pub fn record(&mut self, a: &str, b: &str, winner: Option<CompetitorId>) {
        self.meetings.entry(pair_key(a, b)).or_default().push(winner);
    }

    /// The last `window` meetings of the pair, oldest first
    pub fn recent(&self, a: &str, b: &str, window: usize) -> &[Option<CompetitorId>] {
        match self.meetings.get(&pair_key(a, b)) {
            Some(results) => &results[results.len().saturating_sub(window)..],
            None => &[],
        }
    }

    pub fn meeting_count(&self, a: &str, b: &str) -> usize {
        self.meetings
            .get(&pair_key(a, b))
            .map(|results| results.len())
            .unwrap_or(0)
    }
}

/// Trait for matchup-specific rating adjustments
pub trait MatchupAdjustment: Send + Sync + Debug {
    /// Rating offsets for (home, away) added before the expected score is computed
    fn adjust(&self, home: &str, away: &str, history: &HeadToHeadLog) -> SideValues<f64>;
}

/// The adjustment selected by `config.head_to_head`
pub fn configured_adjustment(config: &RatingConfig) -> Arc<dyn MatchupAdjustment> {
    match &config.head_to_head {
        Some(h2h) => Arc::new(RecentHeadToHead::new(h2h.clone())),
        None => Arc::new(NoMatchupAdjustment),
    }
}

/// Adjustment that never changes anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMatchupAdjustment;

impl MatchupAdjustment for NoMatchupAdjustment {
    fn adjust(&self, _home: &str, _away: &str, _history: &HeadToHeadLog) -> SideValues<f64> {
        SideValues::default()
    }
}

/// Bounded bonus from net wins over the last few meetings
#[derive(Debug, Clone)]
pub struct RecentHeadToHead {
    config: HeadToHeadConfig,
}

impl RecentHeadToHead {
    pub fn new(config: HeadToHeadConfig) -> Self {
        Self { config }
    }
}

impl MatchupAdjustment for RecentHeadToHead {
    fn adjust(&self, home: &str, away: &str, history: &HeadToHeadLog) -> SideValues<f64> {
        let net_wins: i64 = history
            .recent(home, away, self.config.window)
            .iter()
            .map(|winner| match winner.as_deref() {
                Some(w) if w == home => 1,
                Some(w) if w == away => -1,
                _ => 0,
            })
            .sum();

        let bound = self.config.max_adjustment;
        let offset = (net_wins as f64 * self.config.points_per_net_win).clamp(-bound, bound);
        SideValues {
            home: offset,
            away: -offset,
        }
    }
}
