//! CSV ingestion for rating observations and security attributes.
//!
//! Two input files feed a run:
//! - observations: `security_id,date,rating,volume` (volume optional per row)
//! - attributes:   `security_id,sector_id,market_cap_weight`
//!
//! Ratings accept either the numeric 1..=8 encoding or the level name
//! (`strong_buy`, `slight_sell`, ...). Rows are appended in file order, so a
//! correction is simply a later row for the same security and date.

use std::path::Path;

use chrono::NaiveDate;
use ratinglab_core::domain::{
    ParseRatingError, RatingObservation, SectorId, SecurityAttributes, SecurityId,
};
use ratinglab_core::store::RatingStore;
use serde::Deserialize;
use thiserror::Error;

/// Errors from the ingestion layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("malformed CSV in '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("row {row} in '{path}': {reason}")]
    Row { path: String, row: usize, reason: String },
}

#[derive(Debug, Deserialize)]
struct ObservationRow {
    security_id: String,
    date: NaiveDate,
    rating: String,
    volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AttributeRow {
    security_id: String,
    sector_id: String,
    market_cap_weight: f64,
}

/// Append every observation row from `path` into `store`. Returns the number
/// of rows ingested.
pub fn load_observations(store: &mut RatingStore, path: &Path) -> Result<usize, LoadError> {
    let display = path.display().to_string();
    let mut reader = csv::Reader::from_path(path).map_err(|source| LoadError::Csv {
        path: display.clone(),
        source,
    })?;

    let mut count = 0usize;
    for (i, record) in reader.deserialize::<ObservationRow>().enumerate() {
        let row_no = i + 2; // header is row 1
        let row = record.map_err(|source| LoadError::Csv { path: display.clone(), source })?;
        let level = row.rating.parse().map_err(|e: ParseRatingError| LoadError::Row {
            path: display.clone(),
            row: row_no,
            reason: e.to_string(),
        })?;
        let observation = match row.volume {
            Some(v) if v > 0.0 => RatingObservation::with_volume(row.date, level, v),
            _ => RatingObservation::new(row.date, level),
        };
        store.append(SecurityId::new(row.security_id), observation);
        count += 1;
    }
    Ok(count)
}

/// Register attribute rows from `path` into `store`. A later row for the
/// same security replaces the earlier one. Returns the number of rows.
pub fn load_attributes(store: &mut RatingStore, path: &Path) -> Result<usize, LoadError> {
    let display = path.display().to_string();
    let mut reader = csv::Reader::from_path(path).map_err(|source| LoadError::Csv {
        path: display.clone(),
        source,
    })?;

    let mut count = 0usize;
    for (i, record) in reader.deserialize::<AttributeRow>().enumerate() {
        let row_no = i + 2;
        let row = record.map_err(|source| LoadError::Csv { path: display.clone(), source })?;
        if !row.market_cap_weight.is_finite() || row.market_cap_weight < 0.0 {
            return Err(LoadError::Row {
                path: display.clone(),
                row: row_no,
                reason: format!("market_cap_weight must be non-negative, got {}", row.market_cap_weight),
            });
        }
        store.set_attributes(
            SecurityId::new(row.security_id),
            SecurityAttributes {
                sector: SectorId::new(row.sector_id),
                market_cap_weight: row.market_cap_weight,
            },
        );
        count += 1;
    }
    Ok(count)
}
