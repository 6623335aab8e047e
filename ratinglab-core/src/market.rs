//! Market composite — the MSCI market-wide sentiment score.
//!
//! Combines five pre-normalized factors. The engine does no unit
//! conversion: callers (or the runner's derivation helpers) hand every
//! factor in [0, 1]. When the exogenous news-sentiment signal is absent its
//! weight is redistributed proportionally across the remaining four factors,
//! so a missing feed never reads as pessimism.

use serde::{Deserialize, Serialize};

use crate::classify::BandTable;
use crate::config::ConfigError;
use crate::domain::{MarketScore, MsciComponents, SnapshotId};
use crate::rtsi::WEIGHT_SUM_TOLERANCE;
use crate::stats::clamp_unit;

/// MSCI factor weights. Non-negative, sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MsciWeights {
    pub sentiment: f64,
    pub flow: f64,
    pub volatility: f64,
    pub positioning: f64,
    pub news: f64,
}

impl Default for MsciWeights {
    /// Documented defaults: sentiment 0.35, flow 0.25, volatility 0.15,
    /// positioning 0.15, news 0.10.
    fn default() -> Self {
        Self { sentiment: 0.35, flow: 0.25, volatility: 0.15, positioning: 0.15, news: 0.10 }
    }
}

impl MsciWeights {
    pub fn sum(&self) -> f64 {
        self.sentiment + self.flow + self.volatility + self.positioning + self.news
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let parts = [
            ("sentiment", self.sentiment),
            ("flow", self.flow),
            ("volatility", self.volatility),
            ("positioning", self.positioning),
            ("news", self.news),
        ];
        for (component, w) in parts {
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::NegativeWeight { set: "msci", component });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum { set: "msci", sum });
        }
        Ok(())
    }

    /// Effective weights given signal availability. With news absent, the
    /// news weight is spread proportionally over the other four; the result
    /// always sums to 1.
    pub fn effective(&self, has_news: bool) -> [f64; 5] {
        if has_news {
            return [self.sentiment, self.flow, self.volatility, self.positioning, self.news];
        }
        let rest = self.sentiment + self.flow + self.volatility + self.positioning;
        if rest <= 0.0 {
            return [0.25, 0.25, 0.25, 0.25, 0.0];
        }
        let scale = (rest + self.news) / rest;
        [
            self.sentiment * scale,
            self.flow * scale,
            self.volatility * scale,
            self.positioning * scale,
            0.0,
        ]
    }
}

/// Pre-normalized composite inputs, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketInputs {
    /// Market-wide sentiment proxy (e.g. normalized mean rating).
    pub sentiment: f64,
    /// Net capital-flow ratio proxy (bull/bear balance).
    pub flow: f64,
    /// Realized-volatility ratio, inverted so calm markets score high.
    pub volatility: f64,
    /// Long/short positioning or participation ratio.
    pub positioning: f64,
    /// Exogenous news sentiment, supplied by an external collaborator.
    pub news_sentiment: Option<f64>,
}

/// Compute the bounded [0, 100] MSCI composite and its classification.
pub fn score_market(
    inputs: &MarketInputs,
    weights: &MsciWeights,
    bands: &BandTable,
    as_of: chrono::NaiveDate,
    snapshot: &SnapshotId,
) -> MarketScore {
    let sentiment = clamp_unit(inputs.sentiment);
    let flow = clamp_unit(inputs.flow);
    let volatility = clamp_unit(inputs.volatility);
    let positioning = clamp_unit(inputs.positioning);
    let news = inputs.news_sentiment.map(clamp_unit);

    let w = weights.effective(news.is_some());
    let raw = w[0] * sentiment
        + w[1] * flow
        + w[2] * volatility
        + w[3] * positioning
        + w[4] * news.unwrap_or(0.0);
    let msci = (raw * 100.0).clamp(0.0, 100.0);

    MarketScore {
        as_of,
        msci,
        label: bands.classify(msci).to_string(),
        components: MsciComponents {
            sentiment,
            flow,
            volatility,
            positioning,
            news_sentiment: news,
        },
        snapshot: snapshot.clone(),
    }
}

/// Five-day trend of the composite across a daily history: mean of the last
/// five values minus the mean of the five before. Zero until ten days exist.
pub fn msci_trend_5d(history: &[f64]) -> f64 {
    if history.len() < 10 {
        return 0.0;
    }
    let n = history.len();
    let recent = crate::stats::mean(&history[n - 5..]);
    let previous = crate::stats::mean(&history[n - 10..n - 5]);
    recent - previous
}

/// Risk posture derived from the composite's tier and its 5-day trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    MediumHigh,
    High,
    ExtremelyHigh,
    /// Panic-tier markets flag a contrarian entry rather than plain risk.
    ContrarianOpportunity,
}

/// Map the composite tier (and trend swing) to a risk level. A 5-day swing
/// beyond `swing_threshold` bumps mid-tier risk one notch.
pub fn assess_risk(label: &str, trend_5d: f64, swing_threshold: f64) -> RiskLevel {
    let base = match label {
        "extreme_euphoria" => RiskLevel::ExtremelyHigh,
        "healthy_optimism" => RiskLevel::Low,
        "cautious_optimism" | "neutral_sentiment" => RiskLevel::Medium,
        "mild_pessimism" => RiskLevel::MediumHigh,
        "significant_pessimism" => RiskLevel::High,
        "panic_selling" => RiskLevel::ContrarianOpportunity,
        _ => RiskLevel::Medium,
    };
    if trend_5d.abs() > swing_threshold {
        match base {
            RiskLevel::Low => RiskLevel::Medium,
            RiskLevel::Medium => RiskLevel::MediumHigh,
            RiskLevel::MediumHigh => RiskLevel::High,
            other => other,
        }
    } else {
        base
    }
}
