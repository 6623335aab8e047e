//! RatingLab Runner — batch orchestration over the core engines.
//!
//! This crate builds on `ratinglab-core` to provide:
//! - CSV ingestion of rating observations and security attributes
//! - Parallel batch runs (securities fan out across a rayon pool)
//! - Market-input derivation from the snapshot itself
//! - Ranking and distribution summaries
//! - Versioned JSON/CSV artifact export with deterministic run ids

pub mod batch;
pub mod config;
pub mod export;
pub mod loader;
pub mod ranking;

pub use batch::{derive_market_inputs, run_batch, BatchResult, SkippedEntity};
pub use config::{RunConfig, RunId, SectorPreset};
pub use export::{export_json, import_json, save_artifacts, RunArtifact, SCHEMA_VERSION};
pub use loader::{load_attributes, load_observations, LoadError};
pub use ranking::{rank, trending, Distribution, RankedSector, RankedSecurity, RankingSummary};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn batch_result_is_send_sync() {
        assert_send::<BatchResult>();
        assert_sync::<BatchResult>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<SectorPreset>();
        assert_sync::<SectorPreset>();
    }

    #[test]
    fn ranking_summary_is_send_sync() {
        assert_send::<RankingSummary>();
        assert_sync::<RankingSummary>();
    }

    #[test]
    fn run_artifact_is_send_sync() {
        assert_send::<RunArtifact>();
        assert_sync::<RunArtifact>();
    }
}
