//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the rating engine: contests
//! scored and skipped, seasons processed, and prediction accuracy.

use crate::types::SeasonId;
use anyhow::Result;
use prometheus::{
    Encoder, GaugeVec, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the rating engine
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Per-contest metrics
    contest_metrics: ContestMetrics,

    /// Per-season metrics
    season_metrics: SeasonMetrics,
}

/// Per-contest metrics
#[derive(Clone)]
pub struct ContestMetrics {
    /// Contests applied to ratings
    pub contests_scored_total: IntCounter,

    /// Contests skipped by the season fold, by reason
    pub contests_skipped_total: IntCounterVec,

    /// Forecasts issued for unplayed contests
    pub forecasts_issued_total: IntCounter,
}

/// Per-season metrics
#[derive(Clone)]
pub struct SeasonMetrics {
    /// Seasons processed, by status
    pub seasons_processed_total: IntCounterVec,

    /// Time spent processing one season
    pub season_duration_seconds: Histogram,

    /// Prediction accuracy (percent) by season
    pub prediction_accuracy: GaugeVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let contest_metrics = ContestMetrics::new(&registry)?;
        let season_metrics = SeasonMetrics::new(&registry)?;

        Ok(Self {
            registry,
            contest_metrics,
            season_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn contest(&self) -> &ContestMetrics {
        &self.contest_metrics
    }

    pub fn season(&self) -> &SeasonMetrics {
        &self.season_metrics
    }

    /// Record a contest applied to ratings
    pub fn record_contest_scored(&self) {
        self.contest_metrics.contests_scored_total.inc();
    }

    /// Record a contest skipped by the fold
    pub fn record_contest_skipped(&self, reason: &str) {
        self.contest_metrics
            .contests_skipped_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Record forecasts issued for unplayed contests
    pub fn record_forecasts(&self, count: usize) {
        self.contest_metrics
            .forecasts_issued_total
            .inc_by(count as u64);
    }

    /// Record a finished season
    pub fn record_season(&self, status: &str, duration: Duration) {
        self.season_metrics
            .seasons_processed_total
            .with_label_values(&[status])
            .inc();

        self.season_metrics
            .season_duration_seconds
            .observe(duration.as_secs_f64());
    }

    /// Record prediction accuracy for a season
    pub fn record_accuracy(&self, season: SeasonId, accuracy_percent: f64) {
        self.season_metrics
            .prediction_accuracy
            .with_label_values(&[&season.to_string()])
            .set(accuracy_percent);
    }

    /// Render all metrics in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ContestMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let contests_scored_total = IntCounter::new(
            "rating_ledger_contests_scored_total",
            "Total contests applied to ratings",
        )?;
        registry.register(Box::new(contests_scored_total.clone()))?;

        let contests_skipped_total = IntCounterVec::new(
            Opts::new(
                "rating_ledger_contests_skipped_total",
                "Total contests skipped during a season fold",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(contests_skipped_total.clone()))?;

        let forecasts_issued_total = IntCounter::new(
            "rating_ledger_forecasts_issued_total",
            "Total forecasts issued for unplayed contests",
        )?;
        registry.register(Box::new(forecasts_issued_total.clone()))?;

        Ok(Self {
            contests_scored_total,
            contests_skipped_total,
            forecasts_issued_total,
        })
    }
}

impl SeasonMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let seasons_processed_total = IntCounterVec::new(
            Opts::new(
                "rating_ledger_seasons_processed_total",
                "Total seasons processed",
            ),
            &["status"],
        )?;
        registry.register(Box::new(seasons_processed_total.clone()))?;

        let season_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "rating_ledger_season_duration_seconds",
            "Season processing time in seconds",
        ))?;
        registry.register(Box::new(season_duration_seconds.clone()))?;

        let prediction_accuracy = GaugeVec::new(
            Opts::new(
                "rating_ledger_prediction_accuracy_percent",
                "Share of resolved predictions that were correct",
            ),
            &["season"],
        )?;
        registry.register(Box::new(prediction_accuracy.clone()))?;

        Ok(Self {
            seasons_processed_total,
            season_duration_seconds,
            prediction_accuracy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        let _contest = collector.contest();
        let _season = collector.season();
    }

    #[test]
    fn test_contest_counters() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_contest_scored();
        collector.record_contest_scored();
        collector.record_contest_skipped("tied");
        collector.record_forecasts(3);

        assert_eq!(collector.contest().contests_scored_total.get(), 2);
        assert_eq!(
            collector
                .contest()
                .contests_skipped_total
                .with_label_values(&["tied"])
                .get(),
            1
        );
        assert_eq!(collector.contest().forecasts_issued_total.get(), 3);
    }

    #[test]
    fn test_season_recording_and_encoding() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_season("ok", Duration::from_millis(20));
        collector.record_accuracy(2023, 70.0);

        let text = collector.encode_text().unwrap();
        assert!(text.contains("rating_ledger_seasons_processed_total"));
        assert!(text.contains("rating_ledger_prediction_accuracy_percent"));
    }

    #[test]
    fn test_metrics_timer() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let timer = collector.start_timer();

        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.elapsed();

        assert!(duration >= Duration::from_millis(10));

        let final_duration = timer.stop();
        assert!(final_duration >= Duration::from_millis(10));
    }
}
