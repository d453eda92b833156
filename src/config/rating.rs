//! Rating model configuration
//!
//! Every constant the model depends on lives here, and `model_version` is
//! stamped on each record derived from it.

use crate::error::{RatingError, Result};
use serde::{Deserialize, Serialize};

/// How a tied final score is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TiePolicy {
    /// Reject the contest; it is skipped by the season fold
    #[default]
    Reject,
    /// Score both sides 0.5
    HalfPoint,
}

impl std::str::FromStr for TiePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(TiePolicy::Reject),
            "half_point" | "half-point" => Ok(TiePolicy::HalfPoint),
            other => Err(RatingError::ConfigurationError {
                message: format!("Unknown tie policy: {}", other),
            }
            .into()),
        }
    }
}

/// Parameters for the recent head-to-head matchup adjustment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadToHeadConfig {
    /// Number of most recent meetings considered
    pub window: usize,
    /// Rating points per net win inside the window
    pub points_per_net_win: f64,
    /// Absolute bound on the adjustment per side
    pub max_adjustment: f64,
}

impl Default for HeadToHeadConfig {
    fn default() -> Self {
        Self {
            window: 5,
            points_per_net_win: 3.0,
            max_adjustment: 15.0,
        }
    }
}

/// Rating model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub model_version: String,
    pub initial_rating: f64,
    pub base_k_factor: f64,
    pub max_k_factor: f64,
    pub home_margin_sensitivity: f64,
    pub away_margin_sensitivity: f64,
    pub home_advantage: f64,
    pub tie_policy: TiePolicy,
    /// Disabled when absent
    pub head_to_head: Option<HeadToHeadConfig>,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            model_version: "elo-v1".to_string(),
            initial_rating: 1500.0,
            base_k_factor: 32.0,
            max_k_factor: 100.0,
            home_margin_sensitivity: 0.10,
            away_margin_sensitivity: 0.18,
            home_advantage: 65.0,
            tie_policy: TiePolicy::Reject,
            head_to_head: None,
        }
    }
}

impl RatingConfig {
    /// Neutral-site configuration: no home advantage, symmetric margin sensitivity
    pub fn neutral() -> Self {
        Self {
            home_advantage: 0.0,
            away_margin_sensitivity: 0.10,
            ..Self::default()
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.model_version.trim().is_empty() {
            return Err(RatingError::ConfigurationError {
                message: "Model version cannot be empty".to_string(),
            }
            .into());
        }

        if !self.initial_rating.is_finite() {
            return Err(RatingError::ConfigurationError {
                message: "Initial rating must be finite".to_string(),
            }
            .into());
        }

        if !(self.base_k_factor.is_finite() && self.base_k_factor > 0.0) {
            return Err(RatingError::ConfigurationError {
                message: "Base K-factor must be positive and finite".to_string(),
            }
            .into());
        }

        if !self.max_k_factor.is_finite() || self.max_k_factor < self.base_k_factor {
            return Err(RatingError::ConfigurationError {
                message: format!(
                    "Max K-factor {} is below base K-factor {}",
                    self.max_k_factor, self.base_k_factor
                ),
            }
            .into());
        }

        let sensitivity_ok = |value: f64| value.is_finite() && value >= 0.0;
        if !sensitivity_ok(self.home_margin_sensitivity)
            || !sensitivity_ok(self.away_margin_sensitivity)
        {
            return Err(RatingError::ConfigurationError {
                message: "Margin sensitivities must be finite and non-negative".to_string(),
            }
            .into());
        }

        if !self.home_advantage.is_finite() {
            return Err(RatingError::ConfigurationError {
                message: "Home advantage must be finite".to_string(),
            }
            .into());
        }

        if let Some(h2h) = &self.head_to_head {
            if h2h.window == 0 {
                return Err(RatingError::ConfigurationError {
                    message: "Head-to-head window must be at least 1".to_string(),
                }
                .into());
            }
            if !sensitivity_ok(h2h.max_adjustment) || !sensitivity_ok(h2h.points_per_net_win) {
                return Err(RatingError::ConfigurationError {
                    message: "Head-to-head adjustment bounds must be finite and non-negative"
                        .to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}
