//! Serializable run configuration.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ratinglab_core::config::{ConfigError, EngineConfig};
use ratinglab_core::domain::SnapshotId;
use ratinglab_core::sector::SectorWeights;
use serde::{Deserialize, Serialize};

/// Unique identifier for an analysis run (content-addressable hash).
pub type RunId = String;

/// Which historical sector weighting to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectorPreset {
    /// Technical-indicator emphasis.
    Tma,
    /// Relative-return emphasis.
    Irsi,
    /// Use the weights from the engine config verbatim.
    Custom,
}

/// Everything needed to reproduce one batch run: the as-of date, the full
/// engine calibration, and the exogenous signals that do not live in the
/// rating store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Analysis date; observations after it are invisible to the run.
    pub as_of: NaiveDate,

    /// Engine calibration (weights, bands, windows).
    pub engine: EngineConfig,

    /// Sector weighting preset, applied over `engine.sector_weights`.
    pub sector_preset: SectorPreset,

    /// Exogenous per-sector macro/policy adjustments in [-1, 1].
    pub macro_adjustments: BTreeMap<String, f64>,

    /// Exogenous market news sentiment in [0, 1], when a collaborator
    /// supplies it. Absent means the news weight is redistributed.
    pub news_sentiment: Option<f64>,

    /// Prior daily MSCI values, oldest first, for the 5-day trend and risk
    /// assessment. May be empty on a cold start.
    pub msci_history: Vec<f64>,

    /// How many securities the ranking report keeps per direction.
    pub top_n: usize,

    /// Minimum |normalized trend slope| for the ranking's trending list.
    /// Zero keeps every scored security.
    pub trend_floor: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            as_of: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            engine: EngineConfig::default(),
            sector_preset: SectorPreset::Tma,
            macro_adjustments: BTreeMap::new(),
            news_sentiment: None,
            msci_history: Vec::new(),
            top_n: 10,
            trend_floor: 0.25,
        }
    }
}

impl RunConfig {
    /// The sector weights this run actually uses.
    pub fn sector_weights(&self) -> SectorWeights {
        match self.sector_preset {
            SectorPreset::Tma => SectorWeights::tma_default(),
            SectorPreset::Irsi => SectorWeights::irsi_default(),
            SectorPreset::Custom => self.engine.sector_weights,
        }
    }

    /// Fatal validation, run before any scoring starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.sector_weights().validate()
    }

    /// Deterministic run id: hash of the config plus the snapshot it ran
    /// against. Two runs with the same id are bit-identical reproductions.
    pub fn run_id(&self, snapshot: &SnapshotId) -> RunId {
        let json = serde_json::to_string(self).expect("RunConfig serialization is infallible");
        let mut hasher = blake3::Hasher::new();
        hasher.update(json.as_bytes());
        hasher.update(snapshot.0.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_deterministic() {
        let config = RunConfig::default();
        let snap = SnapshotId::from_hash("abc123");
        assert_eq!(config.run_id(&snap), config.run_id(&snap));
    }

    #[test]
    fn run_id_changes_with_config_and_snapshot() {
        let config = RunConfig::default();
        let snap = SnapshotId::from_hash("abc123");
        let mut other = config.clone();
        other.top_n = 5;
        assert_ne!(config.run_id(&snap), other.run_id(&snap));
        assert_ne!(config.run_id(&snap), config.run_id(&SnapshotId::from_hash("def456")));
    }

    #[test]
    fn preset_selects_weights() {
        let mut config = RunConfig::default();
        config.sector_preset = SectorPreset::Irsi;
        assert_eq!(config.sector_weights(), SectorWeights::irsi_default());
        config.sector_preset = SectorPreset::Tma;
        assert_eq!(config.sector_weights(), SectorWeights::tma_default());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = RunConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }
}
