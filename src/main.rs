//! Main entry point for the Rating Ledger replay tool
//!
//! Loads configuration, reads a contest file, replays the requested seasons
//! through the rating engine and prints the run summary as JSON.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use rating_ledger::config::AppConfig;
use rating_ledger::metrics::MetricsCollector;
use rating_ledger::rating::GameOutcomeProcessor;
use rating_ledger::season::{
    FetchFailurePolicy, SeasonOrchestrator, SeasonProcessor, StaticContestFetcher,
};
use rating_ledger::storage::{InMemoryRatingStore, InMemoryRecordStore};
use rating_ledger::types::Contest;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Rating Ledger - Elo ratings and predictions for head-to-head seasons
#[derive(Parser)]
#[command(
    name = "rating-ledger",
    version,
    about = "Replay seasons of contest results into Elo ratings and predictions",
    long_about = "Rating Ledger replays regular-season contests in chronological order, \
                 maintains Elo ratings with home advantage and margin-of-victory K-factors, \
                 and records a win-probability prediction for every contest."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Contest data file
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a JSON array of contests to replay"
    )]
    contests: Option<PathBuf>,

    /// First season override
    #[arg(long, value_name = "SEASON", help = "First season to process")]
    start_season: Option<i32>,

    /// Last season override
    #[arg(long, value_name = "SEASON", help = "Last season to process")]
    end_season: Option<i32>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without replaying")]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Display startup banner with run information
fn display_startup_banner(config: &AppConfig) {
    info!("Rating Ledger {}", rating_ledger::VERSION);
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Model: {}", config.rating.model_version);
    info!(
        "   K-factor: base {} / max {}",
        config.rating.base_k_factor, config.rating.max_k_factor
    );
    info!("   Home advantage: {}", config.rating.home_advantage);
    info!("   Tie policy: {:?}", config.rating.tie_policy);
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(start) = args.start_season {
        config.run.start_season = Some(start);
    }

    if let Some(end) = args.end_season {
        config.run.end_season = Some(end);
    }

    rating_ledger::config::validate_config(&config)?;
    Ok(config)
}

/// Read a JSON array of contests
fn load_contests(path: &Path) -> Result<Vec<Contest>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read contest file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse contest file {}", path.display()))
}

async fn run(config: AppConfig, contests_path: &Path) -> Result<()> {
    let fetcher = StaticContestFetcher::new(load_contests(contests_path)?);
    let competitors = fetcher.competitors();
    info!(
        contests = fetcher.contests().len(),
        competitors = competitors.len(),
        "Loaded contests"
    );

    let (start, end) = match (config.run.start_season, config.run.end_season) {
        (Some(start), Some(end)) => (start, end),
        (start, end) => {
            let (first, last) = fetcher
                .season_range()
                .ok_or_else(|| anyhow!("Contest file contains no contests"))?;
            (start.unwrap_or(first), end.unwrap_or(last))
        }
    };

    let metrics = Arc::new(MetricsCollector::new()?);
    let fetch_policy = if config.run.abort_on_fetch_failure {
        FetchFailurePolicy::Abort
    } else {
        FetchFailurePolicy::TreatAsEmpty
    };

    let season_processor = SeasonProcessor::new(
        Arc::new(fetcher),
        GameOutcomeProcessor::new(config.rating.clone())?,
    )
    .with_fetch_concurrency(config.run.fetch_concurrency)
    .with_fetch_policy(fetch_policy)
    .with_metrics(metrics.clone());

    let orchestrator = SeasonOrchestrator::new(
        season_processor,
        Arc::new(InMemoryRatingStore::new()),
        Arc::new(InMemoryRecordStore::new()),
    )
    .with_metrics(metrics.clone());

    let summary = orchestrator
        .process_seasons(start, end, &competitors)
        .await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    tracing::debug!("Metrics:\n{}", metrics.encode_text()?);

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config);

    if args.dry_run {
        info!("Configuration validation successful");
        return Ok(());
    }

    let Some(contests_path) = args.contests.as_deref() else {
        error!("No contest file given; pass --contests <FILE>");
        std::process::exit(2);
    };

    if let Err(e) = run(config, contests_path).await {
        error!("Replay failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
