//! Engine configuration — weights, bands, windows, quality thresholds.
//!
//! Everything that calibrates the engines lives here and is externally
//! supplied (TOML), never compiled-in: weight vectors, band tables, lookback
//! parameters. `validate()` runs at load time and is fatal — a config that
//! fails validation never reaches per-record computation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::classify::BandSet;
use crate::market::MsciWeights;
use crate::rtsi::RtsiWeights;
use crate::sector::{RotationThresholds, SectorParams, SectorWeights};
use crate::trend::TrendWindow;

/// Configuration problems. Always fatal: rejected at load time, before any
/// score computation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{set} weights must sum to 1 (got {sum})")]
    WeightSum { set: &'static str, sum: f64 },

    #[error("{set} weight '{component}' must be finite and non-negative")]
    NegativeWeight { set: &'static str, component: &'static str },

    #[error("band table '{table}' has no bands")]
    EmptyBandTable { table: String },

    #[error("band table '{table}' needs exactly one more label than edge (labels {labels}, edges {edges})")]
    BandShape { table: String, labels: usize, edges: usize },

    #[error("band table '{table}' edges must be strictly ascending ({lower} before {upper})")]
    BandOrder { table: String, lower: f64, upper: f64 },

    #[error("band table '{table}' contains a non-finite edge")]
    BandNonFinite { table: String },

    #[error("trend window requires min_observations in 3..=lookback (got min {min}, lookback {lookback})")]
    Window { min: usize, lookback: usize },

    #[error("sector parameter '{param}' must be finite and positive (got {value})")]
    SectorParam { param: &'static str, value: f64 },

    #[error("winsorization quantiles must satisfy 0 <= lower <= upper <= 1 (got {lower}, {upper})")]
    WinsorQuantiles { lower: f64, upper: f64 },

    #[error("failed to read config file: {0}")]
    Read(String),

    #[error("failed to parse config file: {0}")]
    Parse(String),
}

/// Data-quality thresholds applied to window coverage (observed / capacity).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    /// Coverage below this attaches a data-quality warning to the batch.
    pub warn_coverage: f64,
    /// Coverage below this attaches a severe warning.
    pub severe_coverage: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self { warn_coverage: 0.7, severe_coverage: 0.5 }
    }
}

/// Full engine calibration, passed explicitly into every batch — never held
/// as module state, so concurrent runs with different calibrations are safe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: TrendWindow,
    pub rtsi_weights: RtsiWeights,
    pub sector_weights: SectorWeights,
    pub sector_params: SectorParams,
    pub msci_weights: MsciWeights,
    pub rotation: RotationThresholds,
    pub bands: BandSet,
    pub quality: QualityThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: TrendWindow::default(),
            rtsi_weights: RtsiWeights::default(),
            sector_weights: SectorWeights::default(),
            sector_params: SectorParams::default(),
            msci_weights: MsciWeights::default(),
            rotation: RotationThresholds::default(),
            bands: BandSet::default(),
            quality: QualityThresholds::default(),
        }
    }
}

impl EngineConfig {
    /// Validate the whole calibration. Must pass before any computation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.min_observations < 3 || self.window.min_observations > self.window.lookback
        {
            return Err(ConfigError::Window {
                min: self.window.min_observations,
                lookback: self.window.lookback,
            });
        }
        self.rtsi_weights.validate()?;
        self.sector_weights.validate()?;
        self.sector_params.validate()?;
        self.msci_weights.validate()?;
        self.bands.validate()
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
        Self::from_toml_str(&text)
    }
}
