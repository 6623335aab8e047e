//! Rating observations and per-security series.
//!
//! A series may contain gaps (days with no observation). Gaps are never
//! interpolated into a concrete rating — they are simply absent from any
//! window handed to the estimators.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::rating::RatingLevel;

/// One immutable rating observation for one security.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingObservation {
    pub date: NaiveDate,
    pub level: RatingLevel,
    /// Turnover/volume on the observation day, if the source provides it.
    pub volume: Option<f64>,
}

impl RatingObservation {
    pub fn new(date: NaiveDate, level: RatingLevel) -> Self {
        Self { date, level, volume: None }
    }

    pub fn with_volume(date: NaiveDate, level: RatingLevel, volume: f64) -> Self {
        Self { date, level, volume: Some(volume) }
    }
}

/// Date-ordered rating observations for one security.
///
/// The constructor sorts by date and keeps the last appended observation for
/// any duplicated date: the store is append-only, so a correction arrives as
/// a later append for the same day and must win over the original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecuritySeries {
    observations: Vec<RatingObservation>,
}

impl SecuritySeries {
    /// Build a series from observations in append order.
    pub fn from_appends(mut appends: Vec<RatingObservation>) -> Self {
        // Stable sort preserves append order within a date, so the last
        // append for a date survives the dedup below.
        appends.sort_by_key(|o| o.date);
        let mut observations: Vec<RatingObservation> = Vec::with_capacity(appends.len());
        for obs in appends {
            match observations.last_mut() {
                Some(last) if last.date == obs.date => *last = obs,
                _ => observations.push(obs),
            }
        }
        Self { observations }
    }

    pub fn observations(&self) -> &[RatingObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// The most recent `n` observations dated at or before `as_of`.
    ///
    /// Returns fewer than `n` when the series is short; never fabricates
    /// observations for missing days.
    pub fn window(&self, as_of: NaiveDate, n: usize) -> &[RatingObservation] {
        let end = self.observations.partition_point(|o| o.date <= as_of);
        let start = end.saturating_sub(n);
        &self.observations[start..end]
    }

    /// Latest observation at or before `as_of`.
    pub fn latest(&self, as_of: NaiveDate) -> Option<&RatingObservation> {
        self.window(as_of, 1).first()
    }
}

/// Static per-security attributes, fixed for the duration of an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityAttributes {
    pub sector: super::ids::SectorId,
    /// Relative market-cap weight within the universe. Not required to sum
    /// to 1 across securities; aggregation normalizes per sector.
    pub market_cap_weight: f64,
}
