//! Artifact export — JSON tables and a CSV security tape for one run.
//!
//! Every persisted artifact carries a `schema_version`; unknown versions are
//! rejected on import so a stale reader fails loudly instead of misreading.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::batch::BatchResult;
use crate::ranking::RankingSummary;

pub const SCHEMA_VERSION: u32 = 1;

/// The on-disk manifest: batch result plus ranking, versioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunArtifact {
    pub schema_version: u32,
    pub result: BatchResult,
    pub ranking: RankingSummary,
}

impl RunArtifact {
    pub fn new(result: BatchResult, ranking: RankingSummary) -> Self {
        Self { schema_version: SCHEMA_VERSION, result, ranking }
    }
}

/// Serialize a run artifact to pretty JSON.
pub fn export_json(artifact: &RunArtifact) -> Result<String> {
    serde_json::to_string_pretty(artifact).context("failed to serialize run artifact to JSON")
}

/// Deserialize a run artifact, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunArtifact> {
    let artifact: RunArtifact =
        serde_json::from_str(json).context("failed to deserialize run artifact from JSON")?;
    if artifact.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            artifact.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(artifact)
}

/// Export the security table as CSV.
///
/// Columns: security, rtsi, label, trend_slope, consistency, confidence,
/// volume_factor, recent_level, score_change_5, observed, coverage
pub fn export_securities_csv(result: &BatchResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "security",
        "rtsi",
        "label",
        "trend_slope",
        "consistency",
        "confidence",
        "volume_factor",
        "recent_level",
        "score_change_5",
        "observed",
        "coverage",
    ])?;
    for s in &result.securities {
        wtr.write_record([
            &s.security.to_string(),
            &format!("{:.4}", s.rtsi),
            &s.label,
            &format!("{:.6}", s.components.trend_slope),
            &format!("{:.6}", s.components.consistency),
            &format!("{:.6}", s.components.confidence),
            &s.components.volume_factor.map(|v| format!("{v:.6}")).unwrap_or_default(),
            s.recent_level.as_str(),
            &s.score_change_5.map(|v| format!("{v:.2}")).unwrap_or_default(),
            &s.observed.to_string(),
            &format!("{:.4}", s.coverage),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Save the full artifact set for one run under
/// `{output_dir}/{as_of}_{run_id_prefix}/`:
/// - `manifest.json` — versioned batch result plus ranking
/// - `securities.json`, `sectors.json`, `market.json` — the three tables
/// - `securities.csv` — the per-security tape
/// Returns the created directory.
pub fn save_artifacts(
    output_dir: &Path,
    result: &BatchResult,
    ranking: &RankingSummary,
) -> Result<PathBuf> {
    let prefix: String = result.run_id.chars().take(12).collect();
    let dir = output_dir.join(format!("{}_{prefix}", result.as_of));
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create artifact directory {}", dir.display()))?;

    let artifact = RunArtifact::new(result.clone(), ranking.clone());
    std::fs::write(dir.join("manifest.json"), export_json(&artifact)?)
        .context("failed to write manifest.json")?;
    write_table(&dir, "securities.json", &result.securities)?;
    write_table(&dir, "sectors.json", &result.sectors)?;
    write_table(&dir, "market.json", &result.market)?;
    std::fs::write(dir.join("securities.csv"), export_securities_csv(result)?)
        .context("failed to write securities.csv")?;
    Ok(dir)
}

fn write_table<T: Serialize>(dir: &Path, name: &str, table: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(table)
        .with_context(|| format!("failed to serialize {name}"))?;
    std::fs::write(dir.join(name), json).with_context(|| format!("failed to write {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_rejects_future_schema() {
        let json = r#"{"schema_version": 999}"#;
        // Either deserialization fails on missing fields or the version gate
        // fires; both reject.
        assert!(import_json(json).is_err());
    }
}
