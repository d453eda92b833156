//! Reductions over predictions: upsets, accuracy and confidence trend

use crate::types::{Prediction, Upset};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Upset for a resolved prediction whose winner differs from the forecast
pub fn detect_upset(prediction: &Prediction) -> Option<Upset> {
    let resolution = prediction.resolution.as_ref()?;
    let actual_winner = resolution.actual_winner.as_ref()?;

    if *actual_winner == prediction.predicted_winner {
        return None;
    }

    Some(Upset {
        contest_id: prediction.contest_id.clone(),
        predicted_winner: prediction.predicted_winner.clone(),
        actual_winner: actual_winner.clone(),
    })
}

/// All upsets among `predictions`, in input order
pub fn upsets<'a, I>(predictions: I) -> Vec<Upset>
where
    I: IntoIterator<Item = &'a Prediction>,
{
    predictions.into_iter().filter_map(detect_upset).collect()
}

/// Percentage of resolved predictions that were correct
///
/// Returns `None` when nothing has resolved yet.
pub fn accuracy<'a, I>(predictions: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a Prediction>,
{
    let (resolved, correct) = predictions
        .into_iter()
        .filter_map(|p| p.resolution.as_ref())
        .fold((0usize, 0usize), |(resolved, correct), r| {
            (resolved + 1, correct + usize::from(r.correct))
        });

    if resolved == 0 {
        return None;
    }

    Some(correct as f64 / resolved as f64 * 100.0)
}

/// Mean forecast confidence for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidencePoint {
    pub date: NaiveDate,
    pub contests: usize,
    pub mean_confidence: f64,
}

/// Mean winning-side probability per day, ascending by date
pub fn confidence_trend<'a, I>(predictions: I) -> Vec<ConfidencePoint>
where
    I: IntoIterator<Item = &'a Prediction>,
{
    let mut by_day: BTreeMap<NaiveDate, (usize, f64)> = BTreeMap::new();
    for prediction in predictions {
        let entry = by_day
            .entry(prediction.as_of_time.date_naive())
            .or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += prediction.confidence();
    }

    by_day
        .into_iter()
        .map(|(date, (contests, total))| ConfidencePoint {
            date,
            contests,
            mean_confidence: total / contests as f64,
        })
        .collect()
}
