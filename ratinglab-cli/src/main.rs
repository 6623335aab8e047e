//! RatingLab CLI — batch scoring and config validation commands.
//!
//! Commands:
//! - `score` — run the three-level analysis over CSV inputs and save artifacts
//! - `validate-config` — parse and validate an engine config without running

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use ratinglab_core::config::EngineConfig;
use ratinglab_core::store::RatingStore;
use ratinglab_runner::{
    load_attributes, load_observations, rank, run_batch, save_artifacts, BatchResult,
    RankingSummary, RunConfig, SectorPreset,
};

#[derive(Parser)]
#[command(name = "ratinglab", about = "RatingLab CLI — rating trend index engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis: RTSI per security, TMA per sector, MSCI.
    Score {
        /// Observations CSV (security_id,date,rating,volume).
        #[arg(long)]
        observations: PathBuf,

        /// Attributes CSV (security_id,sector_id,market_cap_weight).
        #[arg(long)]
        attributes: PathBuf,

        /// Analysis date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        as_of: Option<String>,

        /// Engine config TOML. Defaults to the built-in calibration.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Sector weighting preset: tma or irsi.
        #[arg(long, default_value = "tma")]
        preset: String,

        /// Exogenous market news sentiment in [0, 1].
        #[arg(long)]
        news_sentiment: Option<f64>,

        /// Securities shown per direction in the ranking.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Minimum |normalized slope| for the trending list (0 disables).
        #[arg(long, default_value_t = 0.25)]
        trend_floor: f64,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Parse and validate an engine config TOML, then exit.
    ValidateConfig {
        /// Path to the config file.
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            observations,
            attributes,
            as_of,
            config,
            preset,
            news_sentiment,
            top,
            trend_floor,
            output_dir,
        } => run_score(
            observations,
            attributes,
            as_of,
            config,
            &preset,
            news_sentiment,
            top,
            trend_floor,
            output_dir,
        ),
        Commands::ValidateConfig { config } => {
            let engine = EngineConfig::load(&config)
                .with_context(|| format!("invalid config {}", config.display()))?;
            engine.validate()?;
            println!("OK: {}", config.display());
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_score(
    observations: PathBuf,
    attributes: PathBuf,
    as_of: Option<String>,
    config_path: Option<PathBuf>,
    preset: &str,
    news_sentiment: Option<f64>,
    top: usize,
    trend_floor: f64,
    output_dir: PathBuf,
) -> Result<()> {
    let as_of = as_of
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("--as-of must be YYYY-MM-DD")?
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let engine = match config_path {
        Some(path) => EngineConfig::load(&path)
            .with_context(|| format!("invalid config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let sector_preset = match preset {
        "tma" => SectorPreset::Tma,
        "irsi" => SectorPreset::Irsi,
        other => anyhow::bail!("unknown preset '{other}'. Valid: tma, irsi"),
    };

    let mut store = RatingStore::new();
    let obs_count = load_observations(&mut store, &observations)?;
    let attr_count = load_attributes(&mut store, &attributes)?;
    println!(
        "Loaded {obs_count} observations for {} securities, {attr_count} attribute rows",
        store.security_count()
    );

    let run_config = RunConfig {
        as_of,
        engine,
        sector_preset,
        news_sentiment,
        top_n: top,
        trend_floor,
        ..RunConfig::default()
    };

    let snapshot = store.snapshot(as_of);
    let result = run_batch(&snapshot, &run_config)?;
    let ranking =
        rank(&result.securities, &result.sectors, run_config.top_n, run_config.trend_floor);

    print_summary(&result, &ranking);

    let run_dir = save_artifacts(&output_dir, &result, &ranking)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn print_summary(result: &BatchResult, ranking: &RankingSummary) {
    println!();
    println!("=== RatingLab Run ===");
    println!("As of:      {}", result.as_of);
    println!("Snapshot:   {}", result.snapshot);
    println!(
        "Securities: {} scored, {} skipped",
        result.securities.len(),
        result.skipped_securities.len()
    );
    println!(
        "Sectors:    {} scored, {} skipped",
        result.sectors.len(),
        result.skipped_sectors.len()
    );
    println!();
    println!("--- Market ---");
    println!("MSCI:       {:.1} ({})", result.market.msci, result.market.label);
    println!("5d trend:   {:+.1}", result.msci_trend_5d);
    println!("Risk:       {:?}", result.risk);
    println!();
    println!("--- Strongest securities ---");
    for s in &ranking.top {
        println!("  {:<12} {:>6.1}  {}", s.security, s.rtsi, s.label);
    }
    println!("--- Weakest securities ---");
    for s in &ranking.bottom {
        println!("  {:<12} {:>6.1}  {}", s.security, s.rtsi, s.label);
    }
    if !ranking.trending.is_empty() {
        println!("--- Trending ---");
        for s in &ranking.trending {
            println!("  {:<12} {:>6.1}  {}", s.security, s.rtsi, s.label);
        }
    }
    if !ranking.sectors_by_activity.is_empty() {
        println!("--- Sectors by activity ---");
        for s in &ranking.sectors_by_activity {
            println!("  {:<12} {:>+7.1}  {} ({} members)", s.sector, s.tma, s.label, s.member_count);
        }
    }
    if !result.rotation.is_empty() {
        println!("--- Rotation signals ---");
        for r in &result.rotation {
            println!("  {:<12} {:?} ({:?}, TMA {:+.1})", r.sector, r.direction, r.strength, r.tma);
        }
    }
    for warn in &result.warnings {
        println!("WARNING: {warn}");
    }
    println!();
}
