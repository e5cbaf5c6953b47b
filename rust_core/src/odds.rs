//! Odds conversion between American, decimal and implied-probability forms.
//!
//! This module provides:
//! - American -> decimal conversion with validation
//! - Decimal -> American conversion (rounded to the nearest integer price,
//!   widened to `i64` for long-shot parlays)
//! - Parlay price combination (legs treated as independent events)
//! - Two-way vig removal for fair probabilities
//!
//! The independence assumption in [`combine`] is a payout convention used by
//! sportsbooks, not a statement about how correlated the legs really are.

use crate::error::{ParlayError, Result};

/// Smallest magnitude a valid American price can have.
pub const MIN_AMERICAN_MAGNITUDE: i32 = 100;

/// Reject prices that cannot be written in American notation.
#[inline]
pub fn validate_american(american: i32) -> Result<i32> {
    if american.unsigned_abs() < MIN_AMERICAN_MAGNITUDE as u32 {
        return Err(ParlayError::InvalidOdds { odds: american });
    }
    Ok(american)
}

/// Convert American odds to decimal odds.
///
/// `+150` -> `2.5`, `-200` -> `1.5`.
pub fn to_decimal(american: i32) -> Result<f64> {
    let american = validate_american(american)?;
    let decimal = if american > 0 {
        american as f64 / 100.0 + 1.0
    } else {
        1.0 + 100.0 / (american as f64).abs()
    };
    Ok(decimal)
}

/// Implied probability of a price, in (0, 1). Includes the bookmaker margin.
pub fn implied_probability(american: i32) -> Result<f64> {
    Ok(1.0 / to_decimal(american)?)
}

/// Multiply the decimal odds of every leg.
///
/// An empty slice combines to `1.0` (a stake returned with no profit).
pub fn combine(odds: &[i32]) -> Result<f64> {
    odds.iter()
        .try_fold(1.0_f64, |acc, &american| Ok(acc * to_decimal(american)?))
}

/// Convert decimal odds back to American odds, rounded to the nearest integer.
///
/// Even money (`2.0`) is always written as `+100`. Prices beyond `i64`
/// saturate at `i64::MAX`.
pub fn decimal_to_american(decimal: f64) -> Result<i64> {
    if !decimal.is_finite() || decimal <= 1.0 {
        return Err(ParlayError::InvalidDecimalOdds { decimal });
    }

    let american = if decimal >= 2.0 {
        ((decimal - 1.0) * 100.0).round()
    } else {
        (-100.0 / (decimal - 1.0)).round()
    };

    // Float to int casts saturate
    Ok(american as i64)
}

/// Convert a probability in (0, 1) to its fair American price.
pub fn probability_to_american(probability: f64) -> Result<i64> {
    if !(probability > 0.0 && probability < 1.0) {
        return Err(ParlayError::validation(format!(
            "probability {} must be strictly between 0 and 1",
            probability
        )));
    }
    decimal_to_american(1.0 / probability)
}

/// Remove the bookmaker margin from a two-way market.
///
/// Returns the fair probabilities of both sides, normalised to sum to 1.
pub fn remove_vig(side_a: i32, side_b: i32) -> Result<(f64, f64)> {
    let p_a = implied_probability(side_a)?;
    let p_b = implied_probability(side_b)?;
    let overround = p_a + p_b;
    Ok((p_a / overround, p_b / overround))
}
