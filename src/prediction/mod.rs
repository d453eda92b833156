//! Win-probability forecasts and the views derived from them
//!
//! Forecasts for unplayed contests come from the latest known ratings; once
//! a contest completes its prediction is resolved and may surface as an upset.

pub mod analysis;
pub mod forecast;

// Re-export commonly used types
pub use analysis::{accuracy, confidence_trend, detect_upset, upsets, ConfidencePoint};
pub use forecast::{build_prediction, predicted_side, Forecaster};
