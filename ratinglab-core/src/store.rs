//! Append-only rating store and immutable snapshots.
//!
//! The store accepts observation appends and attribute registration; it never
//! edits history in place. All computation happens against a `Snapshot` — a
//! sorted, deduplicated, content-hashed view of everything dated at or before
//! the as-of date. Identical content yields an identical `SnapshotId`, which
//! is what makes score computation idempotent per snapshot.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{
    RatingObservation, SectorId, SecurityAttributes, SecurityId, SecuritySeries, SnapshotId,
};

/// Append-only collection of rating observations plus an attribute table.
#[derive(Debug, Default, Clone)]
pub struct RatingStore {
    appends: BTreeMap<SecurityId, Vec<RatingObservation>>,
    attributes: BTreeMap<SecurityId, SecurityAttributes>,
}

impl RatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation. Corrections are later appends for the same
    /// date; snapshot construction keeps the last append per date.
    pub fn append(&mut self, security: SecurityId, observation: RatingObservation) {
        self.appends.entry(security).or_default().push(observation);
    }

    /// Register or replace the static attributes for a security.
    pub fn set_attributes(&mut self, security: SecurityId, attributes: SecurityAttributes) {
        self.attributes.insert(security, attributes);
    }

    pub fn security_count(&self) -> usize {
        self.appends.len()
    }

    /// Build the immutable view of everything dated at or before `as_of`.
    pub fn snapshot(&self, as_of: NaiveDate) -> Snapshot {
        let mut series: BTreeMap<SecurityId, SecuritySeries> = BTreeMap::new();
        for (id, appends) in &self.appends {
            let in_range: Vec<RatingObservation> =
                appends.iter().copied().filter(|o| o.date <= as_of).collect();
            if in_range.is_empty() {
                continue;
            }
            series.insert(id.clone(), SecuritySeries::from_appends(in_range));
        }
        let attributes = self.attributes.clone();
        let id = Snapshot::content_hash(as_of, &series, &attributes);
        Snapshot { id, as_of, series, attributes }
    }
}

/// Immutable, content-addressed view of the store at one as-of date.
#[derive(Debug, Clone)]
pub struct Snapshot {
    id: SnapshotId,
    as_of: NaiveDate,
    series: BTreeMap<SecurityId, SecuritySeries>,
    attributes: BTreeMap<SecurityId, SecurityAttributes>,
}

impl Snapshot {
    pub fn id(&self) -> &SnapshotId {
        &self.id
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn securities(&self) -> impl Iterator<Item = &SecurityId> {
        self.series.keys()
    }

    pub fn security_count(&self) -> usize {
        self.series.len()
    }

    pub fn series(&self, security: &SecurityId) -> Option<&SecuritySeries> {
        self.series.get(security)
    }

    pub fn attributes(&self, security: &SecurityId) -> Option<&SecurityAttributes> {
        self.attributes.get(security)
    }

    /// Securities grouped by sector. Securities without attributes are
    /// omitted — they cannot participate in sector aggregation.
    pub fn sectors(&self) -> BTreeMap<SectorId, Vec<SecurityId>> {
        let mut by_sector: BTreeMap<SectorId, Vec<SecurityId>> = BTreeMap::new();
        for id in self.series.keys() {
            if let Some(attrs) = self.attributes.get(id) {
                by_sector.entry(attrs.sector.clone()).or_default().push(id.clone());
            }
        }
        by_sector
    }

    /// Sorted union of all observation dates in the snapshot.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self
            .series
            .values()
            .flat_map(|s| s.observations().iter().map(|o| o.date))
            .collect();
        dates.sort();
        dates.dedup();
        dates
    }

    /// Mean encoded rating score (1..=8 scale) per date across the given
    /// securities. Dates where none of them have an observation are skipped,
    /// never interpolated.
    pub fn mean_score_series(&self, securities: &[SecurityId], dates: &[NaiveDate]) -> Vec<f64> {
        let mut out = Vec::with_capacity(dates.len());
        for &date in dates {
            let mut sum = 0.0;
            let mut count = 0usize;
            for id in securities {
                if let Some(series) = self.series.get(id) {
                    let w = series.window(date, 1);
                    if let Some(obs) = w.first() {
                        if obs.date == date {
                            sum += obs.level.score();
                            count += 1;
                        }
                    }
                }
            }
            if count > 0 {
                out.push(sum / count as f64);
            }
        }
        out
    }

    fn content_hash(
        as_of: NaiveDate,
        series: &BTreeMap<SecurityId, SecuritySeries>,
        attributes: &BTreeMap<SecurityId, SecurityAttributes>,
    ) -> SnapshotId {
        // BTreeMap iteration is key-ordered, so serialization is canonical.
        #[derive(Serialize)]
        struct Canonical<'a> {
            as_of: NaiveDate,
            series: &'a BTreeMap<SecurityId, SecuritySeries>,
            attributes: &'a BTreeMap<SecurityId, SecurityAttributes>,
        }
        let json = serde_json::to_string(&Canonical { as_of, series, attributes })
            .expect("snapshot serialization is infallible");
        SnapshotId::of_canonical_json(&json)
    }
}
