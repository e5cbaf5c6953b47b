//! Discrete risk bands derived from a leg's American odds.
//!
//! Canonical table (inclusive ranges):
//!
//! | Band      | Odds           |
//! |-----------|----------------|
//! | Very Safe | -450 to -300   |
//! | Safe      | -299 to -200   |
//! | Moderate  | -199 to +100   |
//! | High      | +101 to +250   |
//! | Very High | +251 and up    |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ParlayError, Result};
use crate::odds;

/// Longest favourite price the bands cover.
pub const MIN_SUPPORTED_ODDS: i32 = -450;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    VerySafe,
    Safe,
    Moderate,
    High,
    VeryHigh,
}

impl RiskBand {
    pub const ALL: [RiskBand; 5] = [
        RiskBand::VerySafe,
        RiskBand::Safe,
        RiskBand::Moderate,
        RiskBand::High,
        RiskBand::VeryHigh,
    ];

    /// Inclusive odds range `(min, max)` covered by this band.
    pub fn odds_range(&self) -> (i32, i32) {
        match self {
            RiskBand::VerySafe => (MIN_SUPPORTED_ODDS, -300),
            RiskBand::Safe => (-299, -200),
            RiskBand::Moderate => (-199, 100),
            RiskBand::High => (101, 250),
            RiskBand::VeryHigh => (251, i32::MAX),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskBand::VerySafe => "Very Safe",
            RiskBand::Safe => "Safe",
            RiskBand::Moderate => "Moderate",
            RiskBand::High => "High",
            RiskBand::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RiskBand {
    type Err = ParlayError;

    /// Accepts labels ("Very Safe") and snake_case names ("very_safe").
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "very_safe" => Ok(RiskBand::VerySafe),
            "safe" => Ok(RiskBand::Safe),
            "moderate" => Ok(RiskBand::Moderate),
            "high" => Ok(RiskBand::High),
            "very_high" => Ok(RiskBand::VeryHigh),
            _ => Err(ParlayError::validation(format!("unknown risk band: {}", s))),
        }
    }
}

/// Band for a price. Favourites longer than -450 are reported as Very Safe;
/// use [`classify_strict`] to reject them instead.
///
/// Takes any integer price so combined parlay odds beyond `i32` still band.
pub fn classify(american_odds: impl Into<i64>) -> RiskBand {
    match american_odds.into() {
        i64::MIN..=-300 => RiskBand::VerySafe,
        -299..=-200 => RiskBand::Safe,
        -199..=100 => RiskBand::Moderate,
        101..=250 => RiskBand::High,
        _ => RiskBand::VeryHigh,
    }
}

/// Band for a price, rejecting malformed and unsupported odds.
pub fn classify_strict(american_odds: i32) -> Result<RiskBand> {
    odds::validate_american(american_odds)?;
    if american_odds < MIN_SUPPORTED_ODDS {
        return Err(ParlayError::OutOfRangeOdds {
            odds: american_odds,
            min: MIN_SUPPORTED_ODDS,
        });
    }
    Ok(classify(american_odds))
}
