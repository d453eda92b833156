//! Rating storage interface and implementations
//!
//! This module defines the interface for persisting and retrieving end-of-season
//! competitor ratings keyed by (competitor, season), with an in-memory
//! implementation and a mock for tests.

use crate::error::{RatingError, Result};
use crate::types::{CompetitorId, CompetitorRating, SeasonId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

type RatingKey = (CompetitorId, SeasonId);

fn lock_failed(kind: &str) -> anyhow::Error {
    RatingError::StorageError {
        message: format!("Failed to acquire ratings {} lock", kind),
    }
    .into()
}

/// Trait for rating storage operations
pub trait RatingStore: Send + Sync {
    /// Get a competitor's rating as of a season
    fn get_rating(&self, competitor_id: &str, season: SeasonId)
        -> Result<Option<CompetitorRating>>;

    /// Store or replace ratings, keyed by competitor and season
    fn store_ratings(&self, ratings: Vec<CompetitorRating>) -> Result<()>;
}

/// In-memory rating storage implementation
#[derive(Debug, Default)]
pub struct InMemoryRatingStore {
    ratings: RwLock<HashMap<RatingKey, CompetitorRating>>,
}

impl InMemoryRatingStore {
    /// Create a new in-memory rating store
    pub fn new() -> Self {
        Self::default()
    }
}

impl RatingStore for InMemoryRatingStore {
    fn get_rating(
        &self,
        competitor_id: &str,
        season: SeasonId,
    ) -> Result<Option<CompetitorRating>> {
        let ratings = self.ratings.read().map_err(|_| lock_failed("read"))?;
        Ok(ratings.get(&(competitor_id.to_string(), season)).cloned())
    }

    fn store_ratings(&self, entries: Vec<CompetitorRating>) -> Result<()> {
        let mut ratings = self.ratings.write().map_err(|_| lock_failed("write"))?;

        for entry in entries {
            ratings.insert(
                (entry.competitor_id.clone(), entry.as_of_season),
                entry,
            );
        }

        Ok(())
    }
}

/// Mock rating storage for testing
#[derive(Debug, Default)]
pub struct MockRatingStore {
    inner: InMemoryRatingStore,
    store_calls: RwLock<Vec<Vec<CompetitorRating>>>,
    fail_writes: AtomicBool,
}

impl MockRatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all store calls made (for testing)
    pub fn get_store_calls(&self) -> Vec<Vec<CompetitorRating>> {
        self.store_calls
            .read()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Make every subsequent write fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl RatingStore for MockRatingStore {
    fn get_rating(
        &self,
        competitor_id: &str,
        season: SeasonId,
    ) -> Result<Option<CompetitorRating>> {
        self.inner.get_rating(competitor_id, season)
    }

    fn store_ratings(&self, entries: Vec<CompetitorRating>) -> Result<()> {
        // Record the call for testing
        if let Ok(mut calls) = self.store_calls.write() {
            calls.push(entries.clone());
        }

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RatingError::StorageError {
                message: "rating store unavailable".to_string(),
            }
            .into());
        }

        self.inner.store_ratings(entries)
    }
}
