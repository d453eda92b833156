//! Margin-of-victory K-factor policy

use crate::config::RatingConfig;
use crate::types::{Side, SideValues};
use serde::{Deserialize, Serialize};

/// Scale `base_k` by the margin of victory, capped at `cap`
pub fn adjusted_k(base_k: f64, margin: u32, sensitivity: f64, cap: f64) -> f64 {
    (base_k * (1.0 + margin as f64 * sensitivity)).min(cap)
}

/// Per-side K-factor resolution
///
/// Home and away sides carry separate margin sensitivities, so the rating
/// deltas of one contest need not cancel out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KFactorPolicy {
    pub base_k: f64,
    pub max_k: f64,
    pub home_margin_sensitivity: f64,
    pub away_margin_sensitivity: f64,
}

impl KFactorPolicy {
    pub fn sensitivity(&self, side: Side) -> f64 {
        match side {
            Side::Home => self.home_margin_sensitivity,
            Side::Away => self.away_margin_sensitivity,
        }
    }

    pub fn for_side(&self, side: Side, margin: u32) -> f64 {
        adjusted_k(self.base_k, margin, self.sensitivity(side), self.max_k)
    }

    pub fn for_margin(&self, margin: u32) -> SideValues<f64> {
        SideValues {
            home: self.for_side(Side::Home, margin),
            away: self.for_side(Side::Away, margin),
        }
    }
}

impl From<&RatingConfig> for KFactorPolicy {
    fn from(config: &RatingConfig) -> Self {
        Self {
            base_k: config.base_k_factor,
            max_k: config.max_k_factor,
            home_margin_sensitivity: config.home_margin_sensitivity,
            away_margin_sensitivity: config.away_margin_sensitivity,
        }
    }
}

impl Default for KFactorPolicy {
    fn default() -> Self {
        Self::from(&RatingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_margin_keeps_base() {
        assert_eq!(adjusted_k(32.0, 0, 0.1, 100.0), 32.0);
        assert_eq!(adjusted_k(32.0, 0, 0.18, 100.0), 32.0);
    }

    #[test]
    fn test_margin_scaling() {
        assert_eq!(adjusted_k(32.0, 10, 0.1, 100.0), 64.0);
        assert!((adjusted_k(32.0, 1, 0.1, 100.0) - 35.2).abs() < 1e-9);
    }

    #[test]
    fn test_blowout_is_capped() {
        assert_eq!(adjusted_k(32.0, 60, 0.1, 100.0), 100.0);
        assert_eq!(adjusted_k(32.0, 1000, 0.18, 100.0), 100.0);
    }

    #[test]
    fn test_policy_uses_side_sensitivity() {
        let policy = KFactorPolicy::default();
        let k = policy.for_margin(5);
        assert!((k.home - 32.0 * 1.5).abs() < 1e-9);
        assert!((k.away - 32.0 * 1.9).abs() < 1e-9);
        assert!(k.away > k.home);
    }
}
