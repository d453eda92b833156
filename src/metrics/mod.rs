//! Metrics for the rating engine
//!
//! Processors and the orchestrator take an optional collector; nothing is
//! recorded when none is attached.

pub mod collector;

pub use collector::{ContestMetrics, MetricsCollector, MetricsTimer, SeasonMetrics};
