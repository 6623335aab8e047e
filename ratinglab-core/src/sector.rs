//! Sector aggregation — the TMA/IRSI per-sector momentum score.
//!
//! One configurable engine covers both variants: the factor set is fixed
//! (relative return, momentum, volatility adjustment, technical weight,
//! optional macro adjustment) and the two historical weightings ship as
//! presets. Member combination is winsorized and cap-weighted so a single
//! outlier security cannot dominate a sector.

use serde::{Deserialize, Serialize};

use crate::classify::BandTable;
use crate::config::ConfigError;
use crate::domain::{SectorId, SectorScore, SecurityScore, SnapshotId, TmaComponents};
use crate::error::ScoreError;
use crate::rtsi::WEIGHT_SUM_TOLERANCE;
use crate::stats::{self, clamp_signed_unit};

/// TMA factor weights. Non-negative, sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectorWeights {
    pub relative_return: f64,
    pub momentum: f64,
    pub volatility: f64,
    pub technical: f64,
    pub macro_policy: f64,
}

impl SectorWeights {
    /// TMA preset: technical-indicator emphasis.
    pub fn tma_default() -> Self {
        Self {
            relative_return: 0.20,
            momentum: 0.20,
            volatility: 0.15,
            technical: 0.35,
            macro_policy: 0.10,
        }
    }

    /// IRSI preset: relative-return emphasis.
    pub fn irsi_default() -> Self {
        Self {
            relative_return: 0.40,
            momentum: 0.25,
            volatility: 0.10,
            technical: 0.15,
            macro_policy: 0.10,
        }
    }

    pub fn sum(&self) -> f64 {
        self.relative_return + self.momentum + self.volatility + self.technical + self.macro_policy
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let parts = [
            ("relative_return", self.relative_return),
            ("momentum", self.momentum),
            ("volatility", self.volatility),
            ("technical", self.technical),
            ("macro_policy", self.macro_policy),
        ];
        for (component, w) in parts {
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::NegativeWeight { set: "tma", component });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum { set: "tma", sum });
        }
        Ok(())
    }

    /// Effective weights when no macro adjustment is supplied: its weight is
    /// redistributed proportionally across the remaining four factors.
    pub fn without_macro(&self) -> (f64, f64, f64, f64) {
        let rest = self.relative_return + self.momentum + self.volatility + self.technical;
        if rest <= 0.0 {
            return (0.25, 0.25, 0.25, 0.25);
        }
        let scale = (rest + self.macro_policy) / rest;
        (
            self.relative_return * scale,
            self.momentum * scale,
            self.volatility * scale,
            self.technical * scale,
        )
    }
}

impl Default for SectorWeights {
    fn default() -> Self {
        Self::tma_default()
    }
}

/// Normalization parameters for the sector factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectorParams {
    /// Minimum scored members; below this the sector is `InsufficientMembers`.
    pub min_members: usize,
    /// Days in the recent relative-performance and momentum lookback.
    pub momentum_days: usize,
    /// Floor applied to volatility denominators.
    pub vol_floor: f64,
    /// Scale dividing the volatility-adjusted relative return.
    pub relative_scale: f64,
    /// Rating points of 5-observation change that count as full momentum.
    pub momentum_scale: f64,
    /// Winsorization quantiles for member RTSI combination.
    pub winsor_lower: f64,
    pub winsor_upper: f64,
}

impl Default for SectorParams {
    fn default() -> Self {
        Self {
            min_members: 2,
            momentum_days: 5,
            vol_floor: 0.05,
            relative_scale: 10.0,
            momentum_scale: 2.0,
            winsor_lower: 0.1,
            winsor_upper: 0.9,
        }
    }
}

impl SectorParams {
    /// Fatal at configuration load. Scales must be finite and positive (they
    /// sit in denominators) and the winsorization quantiles must be an
    /// ordered pair inside [0, 1] — `stats::percentile` requires it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scales = [
            ("vol_floor", self.vol_floor),
            ("relative_scale", self.relative_scale),
            ("momentum_scale", self.momentum_scale),
        ];
        for (param, value) in scales {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::SectorParam { param, value });
            }
        }
        let unit = 0.0..=1.0;
        if !unit.contains(&self.winsor_lower)
            || !unit.contains(&self.winsor_upper)
            || self.winsor_lower > self.winsor_upper
        {
            return Err(ConfigError::WinsorQuantiles {
                lower: self.winsor_lower,
                upper: self.winsor_upper,
            });
        }
        Ok(())
    }
}

/// One scored member's contribution to its sector.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorMember {
    pub rtsi: f64,
    pub cap_weight: f64,
    pub score_change_5: Option<f64>,
}

impl SectorMember {
    pub fn from_score(score: &SecurityScore, cap_weight: f64) -> Self {
        Self { rtsi: score.rtsi, cap_weight, score_change_5: score.score_change_5 }
    }
}

/// Inputs for scoring one sector at one as-of date.
#[derive(Debug, Clone)]
pub struct SectorInputs<'a> {
    pub sector: &'a SectorId,
    pub members: &'a [SectorMember],
    /// Daily mean rating score for the sector (gaps skipped, not filled).
    pub sector_series: &'a [f64],
    /// Daily mean rating score for the whole market, same dates.
    pub market_series: &'a [f64],
    /// Exogenous macro/policy adjustment in [-1, 1], if supplied.
    pub macro_adjustment: Option<f64>,
}

/// Score one sector. Pure function of its inputs.
pub fn score_sector(
    inputs: &SectorInputs<'_>,
    weights: &SectorWeights,
    params: &SectorParams,
    bands: &BandTable,
    as_of: chrono::NaiveDate,
    snapshot: &SnapshotId,
) -> Result<SectorScore, ScoreError> {
    let sector = inputs.sector;
    if inputs.members.len() < params.min_members {
        return Err(ScoreError::InsufficientMembers {
            sector: sector.to_string(),
            scored: inputs.members.len(),
            required: params.min_members,
        });
    }

    let len = inputs.sector_series.len().min(inputs.market_series.len());
    if len < params.momentum_days {
        return Err(ScoreError::InsufficientHistory {
            entity: sector.to_string(),
            observed: len,
            required: params.momentum_days,
        });
    }
    let sector_series = &inputs.sector_series[inputs.sector_series.len() - len..];
    let market_series = &inputs.market_series[inputs.market_series.len() - len..];

    let relative: Vec<f64> =
        sector_series.iter().zip(market_series).map(|(s, m)| s - m).collect();

    let market_vol = series_volatility(market_series).max(params.vol_floor);
    let sector_vol = series_volatility(sector_series).max(params.vol_floor);

    // (a) Relative return, scaled by market volatility.
    let recent_rel = stats::mean(&relative[len - params.momentum_days..]);
    let f_rel = clamp_signed_unit(recent_rel / (market_vol * params.relative_scale));

    // (b) Momentum: cap-weighted mean of recent member rating-score deltas.
    let f_mom = clamp_signed_unit(member_momentum(inputs.members) / params.momentum_scale);

    // (c) Volatility adjustment: inverse function of the sector-to-market
    // volatility ratio. A sector no wilder than the market scores >= 0.
    let ratio = sector_vol / market_vol;
    let f_vol = clamp_signed_unit(2.0 / (1.0 + ratio) - 1.0);

    // (d) Technical weight: winsorized cap-weighted member RTSI, recentered
    // from [0, 100] onto [-1, 1].
    let f_tech = clamp_signed_unit((technical_weight(inputs.members, params) - 50.0) / 50.0);

    // (e) Optional macro/policy adjustment.
    let f_macro = inputs.macro_adjustment.map(clamp_signed_unit);

    let raw = match f_macro {
        Some(m) => {
            weights.relative_return * f_rel
                + weights.momentum * f_mom
                + weights.volatility * f_vol
                + weights.technical * f_tech
                + weights.macro_policy * m
        }
        None => {
            let (w_rel, w_mom, w_vol, w_tech) = weights.without_macro();
            w_rel * f_rel + w_mom * f_mom + w_vol * f_vol + w_tech * f_tech
        }
    };
    let tma = (raw * 100.0).clamp(-100.0, 100.0);

    Ok(SectorScore {
        sector: sector.clone(),
        as_of,
        tma,
        label: bands.classify(tma).to_string(),
        components: TmaComponents {
            relative_return: f_rel,
            momentum: f_mom,
            volatility_adjustment: f_vol,
            technical: f_tech,
            macro_adjustment: f_macro,
        },
        member_count: inputs.members.len(),
        snapshot: snapshot.clone(),
    })
}

/// Population std of day-over-day changes.
fn series_volatility(series: &[f64]) -> f64 {
    let diffs: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
    stats::std_dev(&diffs)
}

fn member_momentum(members: &[SectorMember]) -> f64 {
    let mut sum = 0.0;
    let mut weight = 0.0;
    for m in members {
        if let Some(change) = m.score_change_5 {
            let w = m.cap_weight.max(0.0);
            sum += change * w;
            weight += w;
        }
    }
    if weight > 0.0 {
        sum / weight
    } else {
        0.0
    }
}

fn technical_weight(members: &[SectorMember], params: &SectorParams) -> f64 {
    let rtsis: Vec<f64> = members.iter().map(|m| m.rtsi).collect();
    let winsorized = stats::winsorize(&rtsis, params.winsor_lower, params.winsor_upper);
    let mut sum = 0.0;
    let mut weight = 0.0;
    for (m, r) in members.iter().zip(&winsorized) {
        let w = m.cap_weight.max(0.0);
        sum += r * w;
        weight += w;
    }
    if weight > 0.0 {
        sum / weight
    } else {
        stats::mean(&winsorized)
    }
}

/// Direction of a rotation signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationDirection {
    In,
    Out,
}

/// Strength of a rotation signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStrength {
    Weak,
    Medium,
    Strong,
}

/// A detected sector rotation signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationSignal {
    pub sector: SectorId,
    pub direction: RotationDirection,
    pub strength: SignalStrength,
    pub tma: f64,
}

/// Thresholds for rotation detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationThresholds {
    pub strong: f64,
    pub weak: f64,
    /// |TMA| above this upgrades a strong signal to `Strong`.
    pub emphatic: f64,
}

impl Default for RotationThresholds {
    fn default() -> Self {
        Self { strong: 30.0, weak: 10.0, emphatic: 50.0 }
    }
}

/// Detect rotation-in/rotation-out signals across a batch of sector scores.
/// Sorted strongest first, then by |TMA| descending.
pub fn detect_rotation(
    scores: &[SectorScore],
    thresholds: &RotationThresholds,
) -> Vec<RotationSignal> {
    let mut signals: Vec<RotationSignal> = scores
        .iter()
        .filter_map(|s| {
            let direction = if s.tma > 0.0 { RotationDirection::In } else { RotationDirection::Out };
            let trending = if s.tma > 0.0 {
                s.components.momentum > 0.0
            } else {
                s.components.momentum < 0.0
            };
            let strength = if s.tma.abs() > thresholds.strong && trending {
                if s.tma.abs() > thresholds.emphatic {
                    SignalStrength::Strong
                } else {
                    SignalStrength::Medium
                }
            } else if s.tma.abs() > thresholds.weak {
                SignalStrength::Weak
            } else {
                return None;
            };
            Some(RotationSignal { sector: s.sector.clone(), direction, strength, tma: s.tma })
        })
        .collect();
    signals.sort_by(|a, b| {
        b.strength
            .cmp(&a.strength)
            .then(b.tma.abs().partial_cmp(&a.tma.abs()).unwrap_or(std::cmp::Ordering::Equal))
    });
    signals
}
