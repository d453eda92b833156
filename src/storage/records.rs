//! Storage for rating change records and predictions
//!
//! Both record types are upserted by contest id, so reprocessing a season
//! never produces a second record for the same contest.

use crate::error::{RatingError, Result};
use crate::types::{ContestId, Prediction, RatingChangeRecord, SeasonId};
use std::collections::HashMap;
use std::sync::RwLock;

/// Trait for persisted record operations
pub trait RecordStore: Send + Sync {
    /// Insert or replace the change record for its contest
    fn upsert_rating_change(&self, record: RatingChangeRecord) -> Result<()>;

    fn get_rating_change(&self, contest_id: &str) -> Result<Option<RatingChangeRecord>>;

    /// Change records of a season in first-insertion order
    fn rating_changes_for_season(&self, season: SeasonId) -> Result<Vec<RatingChangeRecord>>;

    /// Insert or replace the prediction for its contest
    fn upsert_prediction(&self, prediction: Prediction) -> Result<()>;

    fn get_prediction(&self, contest_id: &str) -> Result<Option<Prediction>>;

    /// Predictions of a season in first-insertion order
    fn predictions_for_season(&self, season: SeasonId) -> Result<Vec<Prediction>>;
}

/// Insertion-ordered table with a contest id index
#[derive(Debug)]
struct Table<T> {
    rows: Vec<T>,
    index: HashMap<ContestId, usize>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Clone> Table<T> {
    fn upsert(&mut self, contest_id: ContestId, row: T) {
        match self.index.get(&contest_id) {
            Some(&position) => self.rows[position] = row,
            None => {
                self.index.insert(contest_id, self.rows.len());
                self.rows.push(row);
            }
        }
    }

    fn get(&self, contest_id: &str) -> Option<T> {
        self.index
            .get(contest_id)
            .map(|&position| self.rows[position].clone())
    }
}

/// In-memory record storage implementation
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    rating_changes: RwLock<Table<RatingChangeRecord>>,
    predictions: RwLock<Table<Prediction>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_failed(table: &str) -> anyhow::Error {
    RatingError::StorageError {
        message: format!("Failed to acquire {} lock", table),
    }
    .into()
}

impl RecordStore for InMemoryRecordStore {
    fn upsert_rating_change(&self, record: RatingChangeRecord) -> Result<()> {
        let mut table = self
            .rating_changes
            .write()
            .map_err(|_| lock_failed("rating changes"))?;
        table.upsert(record.contest_id.clone(), record);
        Ok(())
    }

    fn get_rating_change(&self, contest_id: &str) -> Result<Option<RatingChangeRecord>> {
        let table = self
            .rating_changes
            .read()
            .map_err(|_| lock_failed("rating changes"))?;
        Ok(table.get(contest_id))
    }

    fn rating_changes_for_season(&self, season: SeasonId) -> Result<Vec<RatingChangeRecord>> {
        let table = self
            .rating_changes
            .read()
            .map_err(|_| lock_failed("rating changes"))?;
        Ok(table
            .rows
            .iter()
            .filter(|record| record.season == season)
            .cloned()
            .collect())
    }

    fn upsert_prediction(&self, prediction: Prediction) -> Result<()> {
        let mut table = self
            .predictions
            .write()
            .map_err(|_| lock_failed("predictions"))?;
        table.upsert(prediction.contest_id.clone(), prediction);
        Ok(())
    }

    fn get_prediction(&self, contest_id: &str) -> Result<Option<Prediction>> {
        let table = self
            .predictions
            .read()
            .map_err(|_| lock_failed("predictions"))?;
        Ok(table.get(contest_id))
    }

    fn predictions_for_season(&self, season: SeasonId) -> Result<Vec<Prediction>> {
        let table = self
            .predictions
            .read()
            .map_err(|_| lock_failed("predictions"))?;
        Ok(table
            .rows
            .iter()
            .filter(|prediction| prediction.season == season)
            .cloned()
            .collect())
    }
}
