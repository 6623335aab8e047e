//! Batch orchestration: one snapshot in, all three score tables out.
//!
//! The run is a pure function of (snapshot, config). Configuration is
//! validated fatally up front; after that every failure is per-entity — a
//! security or sector that cannot be scored lands in the skipped list with
//! its status and the run continues. Security scoring fans out across a
//! rayon pool and fans back in in deterministic id order, so the same
//! snapshot and config always produce the same output bytes.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use ratinglab_core::classify::Metric;
use ratinglab_core::config::ConfigError;
use ratinglab_core::domain::{
    MarketScore, SectorId, SectorScore, SecurityId, SecurityScore, SnapshotId,
};
use ratinglab_core::error::ScoreError;
use ratinglab_core::market::{self, score_market, MarketInputs, RiskLevel};
use ratinglab_core::rtsi::score_security;
use ratinglab_core::sector::{
    detect_rotation, score_sector, RotationSignal, SectorInputs, SectorMember,
};
use ratinglab_core::store::Snapshot;
use ratinglab_core::trend::{estimate_trend, volume_factor};

use crate::config::{RunConfig, RunId};

/// A 5-day composite swing larger than this bumps the risk level a notch.
const MSCI_SWING_THRESHOLD: f64 = 15.0;

/// An entity excluded from a run, with its machine-readable status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedEntity {
    pub id: String,
    pub status: String,
    pub detail: String,
}

impl SkippedEntity {
    fn from_error(id: String, err: &ScoreError) -> Self {
        Self { id, status: err.status().to_string(), detail: err.to_string() }
    }
}

/// Everything one batch run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub run_id: RunId,
    pub snapshot: SnapshotId,
    pub as_of: NaiveDate,
    pub securities: Vec<SecurityScore>,
    pub skipped_securities: Vec<SkippedEntity>,
    pub sectors: Vec<SectorScore>,
    pub skipped_sectors: Vec<SkippedEntity>,
    pub rotation: Vec<RotationSignal>,
    pub market: MarketScore,
    pub msci_trend_5d: f64,
    pub risk: RiskLevel,
    pub warnings: Vec<String>,
}

/// Run the full three-level analysis against one snapshot.
pub fn run_batch(snapshot: &Snapshot, config: &RunConfig) -> Result<BatchResult, ConfigError> {
    config.validate()?;

    let as_of = config.as_of.min(snapshot.as_of());
    let engine = &config.engine;
    let mut warnings = Vec::new();

    // Per-security fan-out. The id list comes from a BTreeMap, so the
    // collected results are already in deterministic order.
    let ids: Vec<SecurityId> = snapshot.securities().cloned().collect();
    let outcomes: Vec<(SecurityId, Result<SecurityScore, ScoreError>)> = ids
        .par_iter()
        .map(|id| {
            let series = snapshot.series(id).expect("id came from this snapshot");
            let outcome = estimate_trend(id, series, as_of, &engine.window).map(|est| {
                let window = series.window(as_of, engine.window.lookback);
                let vf = volume_factor(window, engine.window.recent_volume_days);
                score_security(
                    id,
                    &est,
                    vf,
                    &engine.rtsi_weights,
                    engine.bands.table(Metric::Rtsi),
                    as_of,
                    snapshot.id(),
                )
            });
            (id.clone(), outcome)
        })
        .collect();

    let mut securities = Vec::with_capacity(outcomes.len());
    let mut skipped_securities = Vec::new();
    for (id, outcome) in outcomes {
        match outcome {
            Ok(score) => {
                if score.coverage < engine.quality.severe_coverage {
                    warnings.push(format!(
                        "security {id}: window coverage {:.2} below severe threshold",
                        score.coverage
                    ));
                } else if score.coverage < engine.quality.warn_coverage {
                    warnings.push(format!("security {id}: window coverage {:.2} is low", score.coverage));
                }
                securities.push(score);
            }
            Err(err) => skipped_securities.push(SkippedEntity::from_error(id.to_string(), &err)),
        }
    }

    // Shared daily series for the relative-performance factors. The date
    // axis is clipped to the analysis date: a snapshot taken later than
    // `as_of` may hold newer observations, and those must stay invisible.
    let mut dates = snapshot.dates();
    dates.retain(|d| *d <= as_of);
    let market_series = snapshot.mean_score_series(&ids, &dates);

    // Per-sector fan-out over the grouped membership.
    let scored: std::collections::BTreeMap<&SecurityId, &SecurityScore> =
        securities.iter().map(|s| (&s.security, s)).collect();
    let sector_weights = config.sector_weights();
    let by_sector = snapshot.sectors();
    let sector_outcomes: Vec<(SectorId, Result<SectorScore, ScoreError>)> = by_sector
        .par_iter()
        .map(|(sector, member_ids)| {
            let members: Vec<SectorMember> = member_ids
                .iter()
                .filter_map(|id| {
                    let score = *scored.get(id)?;
                    let weight = snapshot
                        .attributes(id)
                        .map(|a| a.market_cap_weight)
                        .unwrap_or(0.0);
                    Some(SectorMember::from_score(score, weight))
                })
                .collect();
            let sector_series = snapshot.mean_score_series(member_ids, &dates);
            let inputs = SectorInputs {
                sector,
                members: &members,
                sector_series: &sector_series,
                market_series: &market_series,
                macro_adjustment: config.macro_adjustments.get(&sector.0).copied(),
            };
            let outcome = score_sector(
                &inputs,
                &sector_weights,
                &engine.sector_params,
                engine.bands.table(Metric::Tma),
                as_of,
                snapshot.id(),
            );
            (sector.clone(), outcome)
        })
        .collect();

    let mut sectors = Vec::with_capacity(sector_outcomes.len());
    let mut skipped_sectors = Vec::new();
    for (id, outcome) in sector_outcomes {
        match outcome {
            Ok(score) => sectors.push(score),
            Err(err) => skipped_sectors.push(SkippedEntity::from_error(id.to_string(), &err)),
        }
    }

    let rotation = detect_rotation(&sectors, &engine.rotation);

    // Market composite from snapshot-derived factors plus exogenous news.
    let inputs = derive_market_inputs(snapshot, as_of, &market_series, config.news_sentiment);
    let market = score_market(
        &inputs,
        &engine.msci_weights,
        engine.bands.table(Metric::Msci),
        as_of,
        snapshot.id(),
    );

    let mut history = config.msci_history.clone();
    history.push(market.msci);
    let msci_trend_5d = market::msci_trend_5d(&history);
    let risk = market::assess_risk(&market.label, msci_trend_5d, MSCI_SWING_THRESHOLD);

    Ok(BatchResult {
        run_id: config.run_id(snapshot.id()),
        snapshot: snapshot.id().clone(),
        as_of,
        securities,
        skipped_securities,
        sectors,
        skipped_sectors,
        rotation,
        market,
        msci_trend_5d,
        risk,
        warnings,
    })
}

/// Derive the four endogenous composite factors from the snapshot itself.
///
/// - sentiment: mean of the latest signed rating encodings, recentered from
///   [-1, 1] onto [0, 1]
/// - flow: share of securities whose latest rating is on the buy side
/// - volatility: inverse function of the market mean-score volatility, so a
///   calm market scores high
/// - positioning: share of securities with a fresh observation near the
///   as-of date, against an expected-participation floor of one half
pub fn derive_market_inputs(
    snapshot: &Snapshot,
    as_of: NaiveDate,
    market_series: &[f64],
    news_sentiment: Option<f64>,
) -> MarketInputs {
    let mut latest_sum = 0.0;
    let mut bullish = 0usize;
    let mut rated = 0usize;
    let mut fresh = 0usize;
    let fresh_cutoff = as_of - chrono::Duration::days(5);

    for id in snapshot.securities() {
        let series = snapshot.series(id).expect("id came from this snapshot");
        if let Some(obs) = series.latest(as_of) {
            latest_sum += obs.level.normalized();
            if obs.level.is_bullish() {
                bullish += 1;
            }
            if obs.date > fresh_cutoff {
                fresh += 1;
            }
            rated += 1;
        }
    }

    let (sentiment, flow, positioning) = if rated > 0 {
        let mean = latest_sum / rated as f64;
        (
            (mean + 1.0) / 2.0,
            bullish as f64 / rated as f64,
            (fresh as f64 / rated as f64 / 0.5).min(1.0),
        )
    } else {
        (0.5, 0.5, 0.0)
    };

    let diffs: Vec<f64> = market_series.windows(2).map(|w| w[1] - w[0]).collect();
    let vol = if diffs.is_empty() {
        0.0
    } else {
        let mean = diffs.iter().sum::<f64>() / diffs.len() as f64;
        (diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / diffs.len() as f64).sqrt()
    };
    let volatility = 1.0 / (1.0 + 2.0 * vol);

    MarketInputs { sentiment, flow, volatility, positioning, news_sentiment }
}
