//! Trend estimation over one security's windowed rating series.
//!
//! Produces the {slope, consistency, confidence} triple the RTSI engine
//! combines. Pure function of the window: no caches, no hidden state.
//!
//! Edge-case conventions (deliberate, relied on by tests):
//! - A flat window has consistency 1.0 — an unchanging series is maximally
//!   consistent — while its confidence is 0 because a flat fit carries no
//!   trend evidence.
//! - Below the minimum observation count the estimator returns
//!   `InsufficientHistory` rather than a numerically unstable fit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{RatingLevel, RatingObservation, SecurityId, SecuritySeries, RATING_SPAN};
use crate::error::ScoreError;
use crate::stats::{self, clamp_signed_unit, clamp_unit};

/// Lookback parameters for trend estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendWindow {
    /// Maximum number of most-recent observations considered.
    pub lookback: usize,
    /// Minimum observations required for a fit. Must be at least 3 (the
    /// regression needs a positive degree of freedom).
    pub min_observations: usize,
    /// Observations counted as "recent" when comparing volume participation
    /// against the window baseline.
    pub recent_volume_days: usize,
}

impl Default for TrendWindow {
    fn default() -> Self {
        Self { lookback: 60, min_observations: 5, recent_volume_days: 5 }
    }
}

/// Trend triple plus fit diagnostics for one security window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendEstimate {
    /// Normalized slope in [-1, 1]: predicted rating change across the
    /// window divided by the full rating span, so it is comparable across
    /// securities regardless of observation spacing.
    pub slope: f64,
    /// Raw regression slope in rating points per observation step.
    pub raw_slope: f64,
    /// Path consistency in [0, 1].
    pub consistency: f64,
    /// Statistical confidence in [0, 1]: clamped R² times clamped (1 - p).
    pub confidence: f64,
    pub r_squared: f64,
    pub p_value: f64,
    /// Latest rating level in the window.
    pub recent_level: RatingLevel,
    /// Rating-score change over the last 5 observations, if the window is
    /// long enough.
    pub score_change_5: Option<f64>,
    /// Observations present in the window.
    pub observed: usize,
    /// Observed / lookback capacity, in (0, 1].
    pub coverage: f64,
}

/// Estimate the trend triple for `security` at `as_of`.
pub fn estimate_trend(
    security: &SecurityId,
    series: &SecuritySeries,
    as_of: NaiveDate,
    window: &TrendWindow,
) -> Result<TrendEstimate, ScoreError> {
    let obs = series.window(as_of, window.lookback);
    estimate_trend_window(security, obs, window)
}

/// Estimate from an already-extracted window (most recent last).
pub fn estimate_trend_window(
    security: &SecurityId,
    obs: &[RatingObservation],
    window: &TrendWindow,
) -> Result<TrendEstimate, ScoreError> {
    let required = window.min_observations.max(3);
    if obs.len() < required {
        return Err(ScoreError::InsufficientHistory {
            entity: security.to_string(),
            observed: obs.len(),
            required,
        });
    }

    let scores: Vec<f64> = obs.iter().map(|o| o.level.score()).collect();
    let fit = stats::linear_fit(&scores).expect("window length checked above");

    let n = scores.len();
    let slope = clamp_signed_unit(fit.slope * (n as f64 - 1.0) / RATING_SPAN);
    let consistency = path_consistency(&scores);
    let confidence = clamp_unit(fit.r_squared) * clamp_unit(1.0 - fit.p_value);

    let recent_level = obs.last().expect("window is non-empty").level;
    let score_change_5 = if n >= 6 { Some(scores[n - 1] - scores[n - 6]) } else { None };

    Ok(TrendEstimate {
        slope,
        raw_slope: fit.slope,
        consistency,
        confidence,
        r_squared: fit.r_squared,
        p_value: fit.p_value,
        recent_level,
        score_change_5,
        observed: n,
        coverage: n as f64 / window.lookback as f64,
    })
}

/// Consistency = 1 - (dispersion of step changes / mean absolute change),
/// clamped to [0, 1]. A perfectly monotonic staircase scores 1; an erratic
/// path approaches 0. A flat series (zero mean change) scores 1 by
/// convention: unchanging is maximally consistent.
fn path_consistency(scores: &[f64]) -> f64 {
    let diffs: Vec<f64> = scores.windows(2).map(|w| w[1] - w[0]).collect();
    if diffs.is_empty() {
        return 1.0;
    }
    let mean_abs = stats::mean(&diffs.iter().map(|d| d.abs()).collect::<Vec<_>>());
    if mean_abs <= f64::EPSILON {
        return 1.0;
    }
    clamp_unit(1.0 - stats::std_dev(&diffs) / mean_abs)
}

/// Volume participation factor: one plus the log of recent average volume
/// over the window baseline, clamped to [0, 1.5]. Neutral participation
/// (recent == baseline) yields exactly 1.0. Returns `None` when fewer than
/// two observations in the window carry volume — the RTSI engine then
/// redistributes the volume weight instead of penalizing the security.
pub fn volume_factor(obs: &[RatingObservation], recent: usize) -> Option<f64> {
    let volumes: Vec<f64> = obs.iter().filter_map(|o| o.volume).filter(|v| *v > 0.0).collect();
    if volumes.len() < 2 {
        return None;
    }
    let baseline = stats::mean(&volumes);
    let recent_n = recent.min(volumes.len());
    let recent_avg = stats::mean(&volumes[volumes.len() - recent_n..]);
    if baseline <= 0.0 || recent_avg <= 0.0 {
        return None;
    }
    Some((1.0 + (recent_avg / baseline).ln()).clamp(0.0, 1.5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RatingObservation;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap() + chrono::Duration::days(day as i64)
    }

    fn series_of(levels: &[u8]) -> SecuritySeries {
        SecuritySeries::from_appends(
            levels
                .iter()
                .enumerate()
                .map(|(i, &s)| {
                    RatingObservation::new(d(i as u32), RatingLevel::from_score(s).unwrap())
                })
                .collect(),
        )
    }

    fn sec() -> SecurityId {
        SecurityId::from("TEST")
    }

    #[test]
    fn insufficient_history_is_an_error_not_a_zero() {
        let series = series_of(&[4, 5]);
        let err = estimate_trend(&sec(), &series, d(10), &TrendWindow::default()).unwrap_err();
        assert_eq!(
            err,
            ScoreError::InsufficientHistory { entity: "TEST".into(), observed: 2, required: 5 }
        );
    }

    #[test]
    fn monotonic_rise_has_full_consistency_and_positive_slope() {
        let series = series_of(&[2, 3, 4, 5, 6, 7]);
        let est = estimate_trend(&sec(), &series, d(10), &TrendWindow::default()).unwrap();
        assert!(est.slope > 0.0);
        assert!((est.consistency - 1.0).abs() < 1e-9);
        // Perfect linear fit: full explained variance, zero p-value.
        assert!((est.confidence - 1.0).abs() < 1e-9);
        assert_eq!(est.recent_level, RatingLevel::Buy);
        assert_eq!(est.score_change_5, Some(5.0));
    }

    #[test]
    fn flat_series_consistency_one_confidence_zero() {
        let series = series_of(&[4, 4, 4, 4, 4, 4]);
        let est = estimate_trend(&sec(), &series, d(10), &TrendWindow::default()).unwrap();
        assert_eq!(est.slope, 0.0);
        assert_eq!(est.consistency, 1.0);
        assert_eq!(est.confidence, 0.0);
    }

    #[test]
    fn erratic_series_scores_low_consistency() {
        let series = series_of(&[4, 7, 2, 6, 1, 5, 2, 6]);
        let est = estimate_trend(&sec(), &series, d(10), &TrendWindow::default()).unwrap();
        assert!(est.consistency < 0.3, "got {}", est.consistency);
    }

    #[test]
    fn slope_is_normalized_by_window_span() {
        // Full sweep 1 -> 8 over the window predicts the entire rating span.
        let series = series_of(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let est = estimate_trend(&sec(), &series, d(10), &TrendWindow::default()).unwrap();
        assert!((est.slope - 1.0).abs() < 1e-9);

        let falling = series_of(&[8, 7, 6, 5, 4, 3, 2, 1]);
        let est = estimate_trend(&sec(), &falling, d(10), &TrendWindow::default()).unwrap();
        assert!((est.slope + 1.0).abs() < 1e-9);
    }

    #[test]
    fn window_excludes_observations_after_as_of() {
        let series = series_of(&[2, 3, 4, 5, 6, 7, 8, 8, 8, 8]);
        let full = estimate_trend(&sec(), &series, d(20), &TrendWindow::default()).unwrap();
        let early = estimate_trend(&sec(), &series, d(5), &TrendWindow::default()).unwrap();
        assert_eq!(early.observed, 6);
        assert!(full.observed > early.observed);
    }

    #[test]
    fn volume_factor_neutral_when_recent_matches_baseline() {
        let obs: Vec<RatingObservation> = (0..10)
            .map(|i| RatingObservation::with_volume(d(i), RatingLevel::SlightBuy, 1000.0))
            .collect();
        let vf = volume_factor(&obs, 5).unwrap();
        assert!((vf - 1.0).abs() < 1e-9);
    }

    #[test]
    fn volume_factor_rises_with_recent_participation() {
        let obs: Vec<RatingObservation> = (0..10)
            .map(|i| {
                let v = if i >= 5 { 3000.0 } else { 1000.0 };
                RatingObservation::with_volume(d(i), RatingLevel::SlightBuy, v)
            })
            .collect();
        let vf = volume_factor(&obs, 5).unwrap();
        assert!(vf > 1.0 && vf <= 1.5);
    }

    #[test]
    fn volume_factor_absent_without_volume_data() {
        let obs: Vec<RatingObservation> =
            (0..10).map(|i| RatingObservation::new(d(i), RatingLevel::SlightBuy)).collect();
        assert_eq!(volume_factor(&obs, 5), None);
    }
}
