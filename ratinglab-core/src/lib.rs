//! RatingLab Core — rating-series index engines and domain types.
//!
//! This crate contains the computational heart of the system:
//! - Domain types (rating levels, observations, series, score records)
//! - Append-only rating store with content-addressed snapshots
//! - Trend estimation (slope / consistency / confidence triple)
//! - RTSI per-security trend strength index
//! - TMA/IRSI per-sector momentum aggregation and rotation signals
//! - MSCI market-wide composite with risk assessment
//! - Table-driven band classification shared by all three levels
//!
//! Every engine is a pure function of an immutable snapshot plus an explicit
//! configuration; nothing in this crate holds mutable module state.

pub mod classify;
pub mod config;
pub mod domain;
pub mod error;
pub mod market;
pub mod rtsi;
pub mod sector;
pub mod stats;
pub mod store;
pub mod trend;
