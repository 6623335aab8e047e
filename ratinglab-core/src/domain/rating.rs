//! The 8-level ordinal rating scale.
//!
//! Ratings are the primary observed signal — a discrete analyst/technical
//! standing per security per day, not a price. The scale is closed and
//! evenly spaced, encoded 1..=8 for regression purposes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of discrete rating levels.
pub const RATING_LEVELS: usize = 8;

/// Span of the numeric encoding (highest score minus lowest).
pub const RATING_SPAN: f64 = (RATING_LEVELS - 1) as f64;

/// One tier of the 8-level ordinal rating scale, weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingLevel {
    StrongSell,
    Sell,
    ModerateSell,
    SlightSell,
    SlightBuy,
    ModerateBuy,
    Buy,
    StrongBuy,
}

impl RatingLevel {
    pub const ALL: [RatingLevel; RATING_LEVELS] = [
        RatingLevel::StrongSell,
        RatingLevel::Sell,
        RatingLevel::ModerateSell,
        RatingLevel::SlightSell,
        RatingLevel::SlightBuy,
        RatingLevel::ModerateBuy,
        RatingLevel::Buy,
        RatingLevel::StrongBuy,
    ];

    /// Numeric encoding: 1 (strong sell) through 8 (strong buy).
    pub fn score(self) -> f64 {
        self as usize as f64 + 1.0
    }

    /// Affine encoding to [-1, 1], with the scale midpoint at 0.
    pub fn normalized(self) -> f64 {
        (self.score() - 4.5) / 3.5
    }

    /// Validated construction from the 1..=8 numeric encoding.
    pub fn from_score(score: u8) -> Option<Self> {
        match score {
            1..=8 => Some(Self::ALL[(score - 1) as usize]),
            _ => None,
        }
    }

    /// True for the four buy-side tiers.
    pub fn is_bullish(self) -> bool {
        self >= RatingLevel::SlightBuy
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RatingLevel::StrongSell => "strong_sell",
            RatingLevel::Sell => "sell",
            RatingLevel::ModerateSell => "moderate_sell",
            RatingLevel::SlightSell => "slight_sell",
            RatingLevel::SlightBuy => "slight_buy",
            RatingLevel::ModerateBuy => "moderate_buy",
            RatingLevel::Buy => "buy",
            RatingLevel::StrongBuy => "strong_buy",
        }
    }
}

impl fmt::Display for RatingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RatingLevel {
    type Err = ParseRatingError;

    /// Accepts either the snake_case tier name or the 1..=8 numeric encoding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(n) = s.parse::<u8>() {
            return RatingLevel::from_score(n).ok_or_else(|| ParseRatingError(s.to_string()));
        }
        RatingLevel::ALL
            .iter()
            .copied()
            .find(|lvl| lvl.as_str() == s)
            .ok_or_else(|| ParseRatingError(s.to_string()))
    }
}

/// Error for an unrecognized rating token at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized rating level '{0}' (expected tier name or 1..=8)")]
pub struct ParseRatingError(pub String);
