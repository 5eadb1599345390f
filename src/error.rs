//! Error types
//!
//! Only configuration problems are errors. Bad container measurements are
//! transient and handled by the resolver returning a degenerate layout.

use crate::scene::Phase;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{field} must be at least 1 (got {value})")]
    InvalidCount { field: &'static str, value: usize },

    #[error("{field} must be a positive, finite radius (got {value})")]
    InvalidRadius { field: &'static str, value: f32 },

    #[error("{field} range is empty or negative: {min}..{max}")]
    InvalidRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("{field} must be a finite duration in range (got {value} ms)")]
    InvalidTiming { field: &'static str, value: f64 },

    #[error("{field} must be in 0.0..=1.0 (got {value})")]
    InvalidFraction { field: &'static str, value: f32 },

    #[error("{field} must be finite (got {value})")]
    NonFinite { field: &'static str, value: f32 },

    #[error("invalid breakpoint table: {0}")]
    InvalidBreakpointTable(String),

    #[error("illegal phase transition {from:?} -> {to:?}")]
    IllegalTransition { from: Phase, to: Phase },

    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
