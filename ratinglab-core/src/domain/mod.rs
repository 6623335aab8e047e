//! Domain types: rating scale, observations, series, ids, score rows.

pub mod ids;
pub mod observation;
pub mod rating;
pub mod score;

pub use ids::{SectorId, SecurityId, SnapshotId};
pub use observation::{RatingObservation, SecurityAttributes, SecuritySeries};
pub use rating::{ParseRatingError, RatingLevel, RATING_LEVELS, RATING_SPAN};
pub use score::{
    MarketScore, MsciComponents, RtsiComponents, SectorScore, SecurityScore, TmaComponents,
};
