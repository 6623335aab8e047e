//! Table-driven score classification.
//!
//! A `BandTable` is an ordered list of named tiers separated by edges. Each
//! edge states which side it belongs to, so boundary semantics are explicit
//! in the table rather than buried in comparison operators. Tables are
//! validated once at configuration load; `classify` is then a total function
//! over the reals — every score lands in exactly one tier.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// One boundary between two adjacent bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandEdge {
    pub value: f64,
    /// True when a score exactly at `value` belongs to the band below the
    /// edge, false when it belongs to the band above.
    pub belongs_to_lower: bool,
}

impl BandEdge {
    pub fn lower_inclusive(value: f64) -> Self {
        Self { value, belongs_to_lower: true }
    }

    pub fn upper_inclusive(value: f64) -> Self {
        Self { value, belongs_to_lower: false }
    }
}

/// Ordered, contiguous, total partition of the real line into named tiers.
///
/// `labels` are ascending (weakest tier first) and there is always exactly
/// one more label than edge, so the bottom and top tiers are unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandTable {
    pub name: String,
    pub labels: Vec<String>,
    pub edges: Vec<BandEdge>,
}

impl BandTable {
    pub fn new(
        name: impl Into<String>,
        labels: Vec<String>,
        edges: Vec<BandEdge>,
    ) -> Result<Self, ConfigError> {
        let table = Self { name: name.into(), labels, edges };
        table.validate()?;
        Ok(table)
    }

    /// Structural validation: at least one band, labels = edges + 1, edges
    /// strictly ascending and finite. Contiguity and totality follow from
    /// the representation itself — adjacent bands share an edge and every
    /// edge assigns its boundary to exactly one side.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.labels.is_empty() {
            return Err(ConfigError::EmptyBandTable { table: self.name.clone() });
        }
        if self.labels.len() != self.edges.len() + 1 {
            return Err(ConfigError::BandShape {
                table: self.name.clone(),
                labels: self.labels.len(),
                edges: self.edges.len(),
            });
        }
        for pair in self.edges.windows(2) {
            if !(pair[0].value < pair[1].value) {
                return Err(ConfigError::BandOrder {
                    table: self.name.clone(),
                    lower: pair[0].value,
                    upper: pair[1].value,
                });
            }
        }
        if self.edges.iter().any(|e| !e.value.is_finite()) {
            return Err(ConfigError::BandNonFinite { table: self.name.clone() });
        }
        Ok(())
    }

    /// Map a score to its tier label. Total over finite scores.
    pub fn classify(&self, score: f64) -> &str {
        debug_assert!(score.is_finite(), "classify expects a finite score");
        let mut band = 0;
        for edge in &self.edges {
            let above = if edge.belongs_to_lower {
                score > edge.value
            } else {
                score >= edge.value
            };
            if above {
                band += 1;
            } else {
                break;
            }
        }
        &self.labels[band]
    }
}

/// Which metric a score belongs to; each has its own band table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Rtsi,
    Tma,
    Msci,
}

/// The three band tables used across the engine levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSet {
    pub rtsi: BandTable,
    pub tma: BandTable,
    pub msci: BandTable,
}

impl BandSet {
    pub fn classify(&self, metric: Metric, score: f64) -> &str {
        self.table(metric).classify(score)
    }

    pub fn table(&self, metric: Metric) -> &BandTable {
        match metric {
            Metric::Rtsi => &self.rtsi,
            Metric::Tma => &self.tma,
            Metric::Msci => &self.msci,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rtsi.validate()?;
        self.tma.validate()?;
        self.msci.validate()
    }
}

impl Default for BandSet {
    fn default() -> Self {
        Self {
            rtsi: default_rtsi_bands(),
            tma: default_tma_bands(),
            msci: default_msci_bands(),
        }
    }
}

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Seven-tier RTSI bands over [0, 100]. Edges use the >=-threshold
/// convention: a score exactly at an edge belongs to the stronger tier.
pub fn default_rtsi_bands() -> BandTable {
    BandTable {
        name: "rtsi".into(),
        labels: labels(&[
            "strong_bear",
            "moderate_bear",
            "weak_bear",
            "neutral",
            "weak_bull",
            "moderate_bull",
            "strong_bull",
        ]),
        edges: vec![
            BandEdge::upper_inclusive(20.0),
            BandEdge::upper_inclusive(30.0),
            BandEdge::upper_inclusive(40.0),
            BandEdge::upper_inclusive(50.0),
            BandEdge::upper_inclusive(60.0),
            BandEdge::upper_inclusive(75.0),
        ],
    }
}

/// Seven-tier TMA bands over [-100, 100]. Positive edges belong to the tier
/// below (exactly 30 is "strong", not "extremely_strong"); negative edges
/// belong to the tier above, so the neutral band is closed on both sides.
pub fn default_tma_bands() -> BandTable {
    BandTable {
        name: "tma".into(),
        labels: labels(&[
            "extremely_weak",
            "weak",
            "moderately_weak",
            "neutral",
            "moderately_strong",
            "strong",
            "extremely_strong",
        ]),
        edges: vec![
            BandEdge::upper_inclusive(-30.0),
            BandEdge::upper_inclusive(-20.0),
            BandEdge::upper_inclusive(-10.0),
            BandEdge::lower_inclusive(10.0),
            BandEdge::lower_inclusive(20.0),
            BandEdge::lower_inclusive(30.0),
        ],
    }
}

/// Seven-tier MSCI bands over [0, 100], >=-threshold convention.
pub fn default_msci_bands() -> BandTable {
    BandTable {
        name: "msci".into(),
        labels: labels(&[
            "panic_selling",
            "significant_pessimism",
            "mild_pessimism",
            "neutral_sentiment",
            "cautious_optimism",
            "healthy_optimism",
            "extreme_euphoria",
        ]),
        edges: vec![
            BandEdge::upper_inclusive(25.0),
            BandEdge::upper_inclusive(35.0),
            BandEdge::upper_inclusive(45.0),
            BandEdge::upper_inclusive(55.0),
            BandEdge::upper_inclusive(65.0),
            BandEdge::upper_inclusive(85.0),
        ],
    }
}
