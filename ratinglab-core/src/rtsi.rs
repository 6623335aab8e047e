//! RTSI — per-security rating trend strength index.
//!
//! Weighted combination of the trend triple plus an optional volume
//! participation factor, rescaled to [0, 100] and classified against the
//! RTSI band table. Weights are configuration, not constants: every call
//! receives the weight set, so concurrent runs with different calibrations
//! cannot interfere.

use serde::{Deserialize, Serialize};

use crate::classify::BandTable;
use crate::config::ConfigError;
use crate::domain::{RtsiComponents, SecurityId, SecurityScore, SnapshotId};
use crate::trend::TrendEstimate;

/// Weight tolerance when validating that a weight vector sums to 1.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// RTSI component weights. Must be non-negative and sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RtsiWeights {
    pub slope: f64,
    pub consistency: f64,
    pub confidence: f64,
    pub volume: f64,
}

impl Default for RtsiWeights {
    /// Documented defaults: slope 0.4, consistency 0.3, confidence 0.2,
    /// volume 0.1.
    fn default() -> Self {
        Self { slope: 0.4, consistency: 0.3, confidence: 0.2, volume: 0.1 }
    }
}

impl RtsiWeights {
    pub fn sum(&self) -> f64 {
        self.slope + self.consistency + self.confidence + self.volume
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let parts = [
            ("slope", self.slope),
            ("consistency", self.consistency),
            ("confidence", self.confidence),
            ("volume", self.volume),
        ];
        for (component, w) in parts {
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::NegativeWeight { set: "rtsi", component });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum { set: "rtsi", sum });
        }
        Ok(())
    }

    /// Effective weights when the volume factor is absent: the volume weight
    /// is redistributed proportionally across the other three components, so
    /// a security without volume data is neither penalized nor inflated.
    pub fn without_volume(&self) -> (f64, f64, f64) {
        let rest = self.slope + self.consistency + self.confidence;
        if rest <= 0.0 {
            // Degenerate all-volume weighting; split evenly.
            return (1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0);
        }
        let scale = (rest + self.volume) / rest;
        (self.slope * scale, self.consistency * scale, self.confidence * scale)
    }
}

/// Combine a trend estimate and optional volume factor into the bounded
/// [0, 100] RTSI value.
///
/// The affine calibration maps a fully confident, fully consistent,
/// maximally positive trend with neutral volume to exactly 100; negative
/// slopes pull the combination below zero and clamp to 0.
pub fn rtsi_value(est: &TrendEstimate, volume_factor: Option<f64>, weights: &RtsiWeights) -> f64 {
    let raw = match volume_factor {
        Some(vf) => {
            weights.slope * est.slope
                + weights.consistency * est.consistency
                + weights.confidence * est.confidence
                + weights.volume * vf.clamp(0.0, 1.5)
        }
        None => {
            let (w_s, w_c, w_f) = weights.without_volume();
            w_s * est.slope + w_c * est.consistency + w_f * est.confidence
        }
    };
    (raw * 100.0).clamp(0.0, 100.0)
}

/// Score one security: RTSI value, classification, and component breakdown.
pub fn score_security(
    security: &SecurityId,
    est: &TrendEstimate,
    volume_factor: Option<f64>,
    weights: &RtsiWeights,
    bands: &BandTable,
    as_of: chrono::NaiveDate,
    snapshot: &SnapshotId,
) -> SecurityScore {
    let value = rtsi_value(est, volume_factor, weights);
    SecurityScore {
        security: security.clone(),
        as_of,
        rtsi: value,
        label: bands.classify(value).to_string(),
        components: RtsiComponents {
            trend_slope: est.slope,
            consistency: est.consistency,
            confidence: est.confidence,
            volume_factor,
        },
        recent_level: est.recent_level,
        score_change_5: est.score_change_5,
        observed: est.observed,
        coverage: est.coverage,
        snapshot: snapshot.clone(),
    }
}
