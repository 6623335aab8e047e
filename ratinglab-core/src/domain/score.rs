//! Derived score rows — the engine's three output tables.
//!
//! Scores are ephemeral: pure functions of a snapshot plus configuration,
//! recomputable at any time, never a source of truth. Sector and market rows
//! carry the snapshot id of the security scores they aggregate so stale
//! aggregation is detectable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::{SectorId, SecurityId, SnapshotId};
use super::rating::RatingLevel;

/// Component breakdown behind one RTSI value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RtsiComponents {
    /// Normalized trend slope in [-1, 1].
    pub trend_slope: f64,
    /// Path consistency in [0, 1].
    pub consistency: f64,
    /// Statistical confidence in [0, 1].
    pub confidence: f64,
    /// Volume participation factor (neutral = 1.0); `None` when the source
    /// supplied no volume, in which case its weight was redistributed.
    pub volume_factor: Option<f64>,
}

/// Per-security score row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScore {
    pub security: SecurityId,
    pub as_of: NaiveDate,
    /// RTSI value in [0, 100].
    pub rtsi: f64,
    pub label: String,
    pub components: RtsiComponents,
    /// Latest observed rating level in the window.
    pub recent_level: RatingLevel,
    /// Rating-score change over the last 5 observations, when available.
    pub score_change_5: Option<f64>,
    /// Observations actually present in the lookback window.
    pub observed: usize,
    /// Observed / window capacity, in [0, 1]. Low coverage means a sparse
    /// series and a less reliable fit.
    pub coverage: f64,
    pub snapshot: SnapshotId,
}

/// Component breakdown behind one TMA value. Factors are normalized to
/// [-1, 1] before weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmaComponents {
    pub relative_return: f64,
    pub momentum: f64,
    pub volatility_adjustment: f64,
    pub technical: f64,
    /// Exogenous macro/policy adjustment; `None` when not supplied.
    pub macro_adjustment: Option<f64>,
}

/// Per-sector score row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorScore {
    pub sector: SectorId,
    pub as_of: NaiveDate,
    /// TMA value in [-100, 100].
    pub tma: f64,
    pub label: String,
    pub components: TmaComponents,
    /// Members that contributed a valid SecurityScore.
    pub member_count: usize,
    pub snapshot: SnapshotId,
}

/// Component breakdown behind the market composite. All inputs are
/// pre-normalized to [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsciComponents {
    pub sentiment: f64,
    pub flow: f64,
    pub volatility: f64,
    pub positioning: f64,
    /// Exogenous news sentiment; `None` means the signal was absent and its
    /// weight was redistributed across the other four factors.
    pub news_sentiment: Option<f64>,
}

/// Market-wide score row — one per analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketScore {
    pub as_of: NaiveDate,
    /// MSCI value in [0, 100].
    pub msci: f64,
    pub label: String,
    pub components: MsciComponents,
    pub snapshot: SnapshotId,
}
