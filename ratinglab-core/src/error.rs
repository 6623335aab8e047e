//! Score-time error taxonomy.
//!
//! Per-entity failures are local: a security or sector that cannot be scored
//! is excluded from aggregation and reported with its status — it is never
//! coerced into a neutral number. Configuration problems are a separate,
//! fatal error type (`config::ConfigError`) rejected before any computation.

use thiserror::Error;

/// Non-fatal, per-entity scoring failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    /// Too few observations in the lookback window to fit a trend.
    #[error("insufficient history for '{entity}': {observed} observations, {required} required")]
    InsufficientHistory {
        entity: String,
        observed: usize,
        required: usize,
    },

    /// A sector with too few scored members for a meaningful aggregate.
    #[error("sector '{sector}' has {scored} scored members, {required} required")]
    InsufficientMembers {
        sector: String,
        scored: usize,
        required: usize,
    },

    /// An expected composite input was absent and could not be defaulted.
    /// For the optional news-sentiment factor this never fires — its weight
    /// is redistributed instead.
    #[error("missing composite input '{signal}'")]
    MissingSignal { signal: String },
}

impl ScoreError {
    /// Stable machine-readable status tag for output tables, so consumers
    /// can distinguish "scored but weak" from "not scored".
    pub fn status(&self) -> &'static str {
        match self {
            ScoreError::InsufficientHistory { .. } => "insufficient_history",
            ScoreError::InsufficientMembers { .. } => "insufficient_members",
            ScoreError::MissingSignal { .. } => "missing_signal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tags_are_stable() {
        let err = ScoreError::InsufficientHistory {
            entity: "AAA".into(),
            observed: 2,
            required: 5,
        };
        assert_eq!(err.status(), "insufficient_history");
        assert!(err.to_string().contains("AAA"));
    }
}
