//! Error taxonomy for the parlay engine.
//!
//! Every failure the core can produce is one of these variants, so callers
//! branch on the kind instead of matching on message text.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParlayError {
    /// American odds of zero or strictly between -100 and +100.
    #[error("Invalid American odds: {odds} (must be <= -100 or >= +100)")]
    InvalidOdds { odds: i32 },

    #[error("Invalid decimal odds: {decimal} (must be finite and greater than 1.0)")]
    InvalidDecimalOdds { decimal: f64 },

    /// Well-formed odds that fall below the longest supported favourite price.
    #[error("Odds {odds} outside supported range (minimum {min})")]
    OutOfRangeOdds { odds: i32, min: i32 },

    /// A game cannot supply `props_per_game` in-range, diversified legs.
    /// Counts are legs.
    #[error("Insufficient props: requested {requested}, available {available}")]
    InsufficientProps { requested: usize, available: usize },

    /// Fewer games than requested have eligible legs. Counts are games.
    #[error("Insufficient games: requested {requested}, available {available}")]
    InsufficientGames { requested: usize, available: usize },

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl ParlayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True for failures caused by the candidate pool rather than the request shape.
    pub fn is_insufficient(&self) -> bool {
        matches!(
            self,
            Self::InsufficientProps { .. } | Self::InsufficientGames { .. }
        )
    }
}

/// Result type alias for ParlayError
pub type Result<T> = std::result::Result<T, ParlayError>;
