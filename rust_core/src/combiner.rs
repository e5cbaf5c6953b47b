//! Combine selected legs into a single parlay.
//!
//! The combined price multiplies every leg's decimal odds (legs treated as
//! independent). The aggregate confidence is the plain mean of the leg
//! scores: a readability heuristic, not a joint probability, since no leg
//! correlation data is available.

use serde::{Deserialize, Serialize};

use crate::confidence::ConfidenceEstimate;
use crate::error::{ParlayError, Result};
use crate::odds;
use crate::risk_band::{self, RiskBand};
use crate::selector::ScoredProposition;
use crate::types::{Market, Proposition, Side};

/// Fraction of the line moved for alternate suggestions (x0.8 / x1.2)
pub const ALTERNATE_LINE_SHIFT: f64 = 0.2;

/// Confidence points added to the safer alternate and removed from the riskier one
pub const ALTERNATE_CONFIDENCE_DELTA: f64 = 10.0;

/// A selected proposition and its estimate. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParlayLeg {
    proposition: Proposition,
    estimate: ConfidenceEstimate,
}

impl ParlayLeg {
    pub fn new(proposition: Proposition, estimate: ConfidenceEstimate) -> Self {
        Self {
            proposition,
            estimate,
        }
    }

    pub fn proposition(&self) -> &Proposition {
        &self.proposition
    }

    pub fn estimate(&self) -> &ConfidenceEstimate {
        &self.estimate
    }

    pub fn confidence(&self) -> f64 {
        self.estimate.score
    }
}

impl From<ScoredProposition> for ParlayLeg {
    fn from(scored: ScoredProposition) -> Self {
        Self::new(scored.proposition, scored.estimate)
    }
}

/// One heuristic line variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlternateLine {
    pub line: f64,
    pub confidence: f64,
}

/// Safer and riskier variants of one leg's line.
///
/// These are presentation aids and are not re-scored by the confidence
/// scorer; `heuristic` is always true.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlternateLines {
    pub subject: String,
    pub market: Market,
    pub side: Side,
    pub base_line: f64,
    pub safer: AlternateLine,
    pub riskier: AlternateLine,
    pub heuristic: bool,
}

/// Final parlay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParlayResult {
    pub legs: Vec<ParlayLeg>,
    pub combined_decimal_odds: f64,
    pub combined_american_odds: i64,
    pub aggregate_confidence: f64,
    /// Band of the combined price
    pub risk_band: RiskBand,
    /// One entry per leg that has a line, in leg order
    pub alternate_suggestions: Vec<AlternateLines>,
}

impl ParlayResult {
    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }
}

/// Direction (+1 raise, -1 lower) that moves a line toward hitting.
fn safer_direction(prop: &Proposition) -> f64 {
    match (prop.market, prop.effective_side()) {
        // Spread lines are added to the subject's margin
        (Market::Spread, _) => 1.0,
        (_, Side::Over) => -1.0,
        (_, Side::Under) => 1.0,
    }
}

/// Safer and riskier variants of a leg; `None` for legs without a line.
pub fn alternate_lines(leg: &ParlayLeg) -> Option<AlternateLines> {
    let prop = leg.proposition();
    let line = prop.line?;
    let step = line.abs() * ALTERNATE_LINE_SHIFT * safer_direction(prop);
    let confidence = leg.confidence();

    Some(AlternateLines {
        subject: prop.subject.clone(),
        market: prop.market,
        side: prop.side,
        base_line: line,
        safer: AlternateLine {
            line: line + step,
            confidence: (confidence + ALTERNATE_CONFIDENCE_DELTA).clamp(0.0, 100.0),
        },
        riskier: AlternateLine {
            line: line - step,
            confidence: (confidence - ALTERNATE_CONFIDENCE_DELTA).clamp(0.0, 100.0),
        },
        heuristic: true,
    })
}

/// Combine legs into a parlay.
pub fn combine(legs: Vec<ParlayLeg>) -> Result<ParlayResult> {
    if legs.is_empty() {
        return Err(ParlayError::validation("cannot build a parlay with no legs"));
    }

    let prices: Vec<i32> = legs.iter().map(|l| l.proposition().american_odds).collect();
    let combined_decimal_odds = odds::combine(&prices)?;

    // A single leg keeps its posted price; even money would otherwise
    // normalise -100 to +100.
    let combined_american_odds = if prices.len() == 1 {
        i64::from(prices[0])
    } else {
        odds::decimal_to_american(combined_decimal_odds)?
    };

    let aggregate_confidence =
        legs.iter().map(ParlayLeg::confidence).sum::<f64>() / legs.len() as f64;

    let alternate_suggestions = legs.iter().filter_map(alternate_lines).collect();

    Ok(ParlayResult {
        risk_band: risk_band::classify(combined_american_odds),
        combined_decimal_odds,
        combined_american_odds,
        aggregate_confidence,
        alternate_suggestions,
        legs,
    })
}
