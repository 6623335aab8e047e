//! Post-run ranking and distribution summaries.

use serde::{Deserialize, Serialize};

use ratinglab_core::domain::{SectorScore, SecurityScore};

/// Cross-sectional summary of one run's security scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingSummary {
    /// Strongest securities, RTSI descending.
    pub top: Vec<RankedSecurity>,
    /// Weakest securities, RTSI ascending.
    pub bottom: Vec<RankedSecurity>,
    /// Securities whose normalized trend slope clears the configured floor,
    /// RTSI descending, capped like the directional lists. Empty when the
    /// floor filters everything out.
    pub trending: Vec<RankedSecurity>,
    /// Sectors ordered by |TMA| descending — the most active first,
    /// whichever direction they are moving.
    pub sectors_by_activity: Vec<RankedSector>,
    pub distribution: Distribution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSecurity {
    pub security: String,
    pub rtsi: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSector {
    pub sector: String,
    pub tma: f64,
    pub label: String,
    pub member_count: usize,
}

/// Distribution statistics over the scored universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub scored: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Scored securities per band label, in band order where possible.
    pub by_label: Vec<(String, usize)>,
}

/// Securities whose normalized trend slope clears `min_slope` — the "actually
/// trending" subset, for rankings that should ignore drifting names.
pub fn trending<'a>(securities: &'a [SecurityScore], min_slope: f64) -> Vec<&'a SecurityScore> {
    securities.iter().filter(|s| s.components.trend_slope.abs() >= min_slope).collect()
}

/// Build the ranking summary for one run. `top_n` caps the directional lists
/// and the trending list; `trend_floor` is the minimum |normalized slope|
/// for the trending list (0 keeps every scored security).
pub fn rank(
    securities: &[SecurityScore],
    sectors: &[SectorScore],
    top_n: usize,
    trend_floor: f64,
) -> RankingSummary {
    let by_rtsi_desc = |a: &&SecurityScore, b: &&SecurityScore| {
        b.rtsi
            .partial_cmp(&a.rtsi)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.security.cmp(&b.security))
    };
    let mut by_rtsi: Vec<&SecurityScore> = securities.iter().collect();
    by_rtsi.sort_by(by_rtsi_desc);

    let ranked = |s: &SecurityScore| RankedSecurity {
        security: s.security.to_string(),
        rtsi: s.rtsi,
        label: s.label.clone(),
    };
    let top: Vec<RankedSecurity> = by_rtsi.iter().take(top_n).map(|s| ranked(s)).collect();
    let bottom: Vec<RankedSecurity> = by_rtsi.iter().rev().take(top_n).map(|s| ranked(s)).collect();

    let mut moving = trending(securities, trend_floor);
    moving.sort_by(by_rtsi_desc);
    let trending: Vec<RankedSecurity> = moving.iter().take(top_n).map(|s| ranked(s)).collect();

    let mut by_activity: Vec<&SectorScore> = sectors.iter().collect();
    by_activity.sort_by(|a, b| {
        b.tma
            .abs()
            .partial_cmp(&a.tma.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.sector.cmp(&b.sector))
    });
    let sectors_by_activity = by_activity
        .into_iter()
        .map(|s| RankedSector {
            sector: s.sector.to_string(),
            tma: s.tma,
            label: s.label.clone(),
            member_count: s.member_count,
        })
        .collect();

    RankingSummary {
        top,
        bottom,
        trending,
        sectors_by_activity,
        distribution: distribution(&by_rtsi),
    }
}

fn distribution(sorted_desc: &[&SecurityScore]) -> Distribution {
    if sorted_desc.is_empty() {
        return Distribution {
            scored: 0,
            mean: 0.0,
            median: 0.0,
            min: 0.0,
            max: 0.0,
            by_label: Vec::new(),
        };
    }
    let n = sorted_desc.len();
    let values: Vec<f64> = sorted_desc.iter().map(|s| s.rtsi).collect();
    let mean = values.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    };

    let mut by_label: Vec<(String, usize)> = Vec::new();
    for s in sorted_desc {
        match by_label.iter_mut().find(|(l, _)| *l == s.label) {
            Some((_, count)) => *count += 1,
            None => by_label.push((s.label.clone(), 1)),
        }
    }

    Distribution {
        scored: n,
        mean,
        median,
        min: values[n - 1],
        max: values[0],
        by_label,
    }
}
