//! Shared numeric utilities: descriptive statistics, winsorization, and
//! ordinary least squares with significance testing.
//!
//! Everything here is pure and allocation-light; the engines above never do
//! their own regression arithmetic.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Clamp to the unit interval.
pub fn clamp_unit(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Clamp to [-1, 1].
pub fn clamp_signed_unit(x: f64) -> f64 {
    x.clamp(-1.0, 1.0)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Interpolated percentile, `p` in [0, 1].
pub fn percentile(values: &[f64], p: f64) -> f64 {
    assert!((0.0..=1.0).contains(&p), "percentile must be in [0, 1]");
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = p * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

/// Winsorize: clamp every value to the [lower_q, upper_q] percentile range.
///
/// Used by sector aggregation so one extreme member cannot dominate a
/// cap-weighted mean.
pub fn winsorize(values: &[f64], lower_q: f64, upper_q: f64) -> Vec<f64> {
    if values.len() < 3 {
        return values.to_vec();
    }
    let lo = percentile(values, lower_q);
    let hi = percentile(values, upper_q);
    values.iter().map(|v| v.clamp(lo, hi)).collect()
}

/// Ordinary least squares fit of `y` against the index 0..n.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Change in y per index step.
    pub slope: f64,
    pub intercept: f64,
    /// Explained variance in [0, 1]. Zero-variance input yields 0: a flat
    /// series carries no evidence of a trend.
    pub r_squared: f64,
    /// Two-sided p-value of the slope (Student's t, n-2 df). A perfect
    /// non-flat fit yields 0; a flat series yields 1.
    pub p_value: f64,
    pub n: usize,
}

/// Fit `y` against its index. Requires at least 3 points so the t-test has
/// a positive degree of freedom; returns `None` below that.
pub fn linear_fit(y: &[f64]) -> Option<LinearFit> {
    let n = y.len();
    if n < 3 {
        return None;
    }
    let nf = n as f64;
    let x_mean = (nf - 1.0) / 2.0;
    let y_mean = mean(y);

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (i, &yi) in y.iter().enumerate() {
        let dx = i as f64 - x_mean;
        let dy = yi - y_mean;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    if syy <= f64::EPSILON {
        // Flat series: no variance to explain, no trend evidence.
        return Some(LinearFit { slope: 0.0, intercept, r_squared: 0.0, p_value: 1.0, n });
    }

    let sse = (syy - slope * sxy).max(0.0);
    let r_squared = clamp_unit(1.0 - sse / syy);

    let df = nf - 2.0;
    let p_value = if sse <= f64::EPSILON {
        // Perfect fit: residual variance is zero, the slope is exact.
        0.0
    } else {
        let se = (sse / df / sxx).sqrt();
        let t = (slope / se).abs();
        let dist = StudentsT::new(0.0, 1.0, df).expect("df >= 1 by construction");
        2.0 * (1.0 - dist.cdf(t))
    };

    Some(LinearFit { slope, intercept, r_squared, p_value: clamp_unit(p_value), n })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn mean_and_std() {
        assert!((mean(&[1.0, 2.0, 3.0]) - 2.0).abs() < EPS);
        assert!((std_dev(&[2.0, 2.0, 2.0])).abs() < EPS);
        // Population std of {1,3} is 1.
        assert!((std_dev(&[1.0, 3.0]) - 1.0).abs() < EPS);
    }

    #[test]
    fn percentile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&v, 0.5) - 2.5).abs() < EPS);
        assert!((percentile(&v, 0.0) - 1.0).abs() < EPS);
        assert!((percentile(&v, 1.0) - 4.0).abs() < EPS);
    }

    #[test]
    fn winsorize_clamps_outliers() {
        let v = [1.0, 2.0, 3.0, 4.0, 100.0];
        let w = winsorize(&v, 0.1, 0.9);
        assert!(w[4] < 100.0);
        assert_eq!(w[1], 2.0);
    }

    #[test]
    fn fit_recovers_exact_line() {
        let y = [1.0, 3.0, 5.0, 7.0, 9.0];
        let fit = linear_fit(&y).unwrap();
        assert!((fit.slope - 2.0).abs() < EPS);
        assert!((fit.intercept - 1.0).abs() < EPS);
        assert!((fit.r_squared - 1.0).abs() < EPS);
        assert_eq!(fit.p_value, 0.0);
    }

    #[test]
    fn fit_flat_series_has_no_trend_evidence() {
        let fit = linear_fit(&[4.0, 4.0, 4.0, 4.0]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r_squared, 0.0);
        assert_eq!(fit.p_value, 1.0);
    }

    #[test]
    fn fit_noisy_series_has_moderate_significance() {
        let y = [3.0, 5.0, 4.0, 6.0, 5.0, 7.0, 6.0, 8.0];
        let fit = linear_fit(&y).unwrap();
        assert!(fit.slope > 0.0);
        assert!(fit.r_squared > 0.3 && fit.r_squared < 1.0);
        assert!(fit.p_value > 0.0 && fit.p_value < 0.05);
    }

    #[test]
    fn fit_requires_three_points() {
        assert!(linear_fit(&[1.0, 2.0]).is_none());
        assert!(linear_fit(&[1.0, 2.0, 3.0]).is_some());
    }
}
