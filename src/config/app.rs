//! Main application configuration
//!
//! This module defines the primary configuration structures for the rating
//! engine, including environment variable and TOML file loading and validation.

use crate::config::rating::RatingConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
    pub run: RunSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Settings for a multi-season replay
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// First season to process; derived from the data when unset
    pub start_season: Option<i32>,
    /// Last season to process; derived from the data when unset
    pub end_season: Option<i32>,
    /// Maximum concurrent per-competitor contest fetches
    pub fetch_concurrency: usize,
    /// Fail the season instead of treating a failed fetch as empty
    pub abort_on_fetch_failure: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "rating-ledger".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            start_season: None,
            end_season: None,
            fetch_concurrency: 8,
            abort_on_fetch_failure: false,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("Invalid {} value: {}", name, value))
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Rating model settings
        if let Ok(version) = env::var("MODEL_VERSION") {
            self.rating.model_version = version;
        }
        if let Ok(value) = env::var("INITIAL_RATING") {
            self.rating.initial_rating = parse_var("INITIAL_RATING", &value)?;
        }
        if let Ok(value) = env::var("BASE_K_FACTOR") {
            self.rating.base_k_factor = parse_var("BASE_K_FACTOR", &value)?;
        }
        if let Ok(value) = env::var("MAX_K_FACTOR") {
            self.rating.max_k_factor = parse_var("MAX_K_FACTOR", &value)?;
        }
        if let Ok(value) = env::var("HOME_MARGIN_SENSITIVITY") {
            self.rating.home_margin_sensitivity = parse_var("HOME_MARGIN_SENSITIVITY", &value)?;
        }
        if let Ok(value) = env::var("AWAY_MARGIN_SENSITIVITY") {
            self.rating.away_margin_sensitivity = parse_var("AWAY_MARGIN_SENSITIVITY", &value)?;
        }
        if let Ok(value) = env::var("HOME_ADVANTAGE") {
            self.rating.home_advantage = parse_var("HOME_ADVANTAGE", &value)?;
        }
        if let Ok(value) = env::var("TIE_POLICY") {
            self.rating.tie_policy = value.parse()?;
        }

        // Run settings
        if let Ok(value) = env::var("START_SEASON") {
            self.run.start_season = Some(parse_var("START_SEASON", &value)?);
        }
        if let Ok(value) = env::var("END_SEASON") {
            self.run.end_season = Some(parse_var("END_SEASON", &value)?);
        }
        if let Ok(value) = env::var("FETCH_CONCURRENCY") {
            self.run.fetch_concurrency = parse_var("FETCH_CONCURRENCY", &value)?;
        }
        if let Ok(value) = env::var("ABORT_ON_FETCH_FAILURE") {
            self.run.abort_on_fetch_failure = parse_var("ABORT_ON_FETCH_FAILURE", &value)?;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    config.rating.validate()?;

    if config.run.fetch_concurrency == 0 {
        return Err(anyhow!("Fetch concurrency must be greater than 0"));
    }

    if let (Some(start), Some(end)) = (config.run.start_season, config.run.end_season) {
        if start > end {
            return Err(anyhow!(
                "Start season {} is after end season {}",
                start,
                end
            ));
        }
    }

    Ok(())
}
