//! Parlay Core - Parlay construction and confidence scoring.
//!
//! This module provides:
//! - American/decimal/implied-probability odds math
//! - Recent-form trend summaries per player and stat
//! - Ensemble confidence scoring (Bayesian, normal, Poisson, matchup, market signal)
//! - Risk band classification from posted odds
//! - Constrained, diversified leg selection for SGP and SGP+ parlays
//! - Parlay combination with alternate-line suggestions
//! - Per-game moneyline/spread/total picks
//! - Collaborator traits and a caller-owned TTL cache for fetched data
//!
//! The scoring path performs no I/O; everything it needs arrives in a
//! [`ParlayRequest`].

pub mod combiner;
pub mod confidence;
pub mod config;
pub mod engine;
pub mod error;
pub mod odds;
pub mod predictions;
pub mod providers;
pub mod risk_band;
pub mod selector;
pub mod trend;
mod types;

#[cfg(feature = "python")]
use pyo3::exceptions::PyValueError;
#[cfg(feature = "python")]
use pyo3::prelude::*;

pub use combiner::{AlternateLine, AlternateLines, ParlayLeg, ParlayResult};
pub use confidence::{ConfidenceEstimate, ConfidenceScorer};
pub use config::{EngineConfig, ScorerConfig};
pub use engine::{build_parlay, build_parlays, score_candidates, ParlayRequest};
pub use error::{ParlayError, Result};
pub use predictions::{predict_games, GamePick, GamePrediction};
pub use risk_band::RiskBand;
pub use selector::{Constraints, ScoredProposition};
pub use trend::{TrendSummary, TrendWindow};
pub use types::*;

#[cfg(feature = "python")]
fn to_py_err(e: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Build a parlay from a JSON-encoded [`ParlayRequest`], returning JSON.
///
/// Engine tunables come from `PARLAY_*` environment variables.
#[cfg(feature = "python")]
#[pyfunction]
fn build_parlay_json(request_json: &str) -> PyResult<String> {
    let request: ParlayRequest = serde_json::from_str(request_json).map_err(to_py_err)?;
    let result = build_parlay(&request, &EngineConfig::from_env()).map_err(to_py_err)?;
    serde_json::to_string(&result).map_err(to_py_err)
}

/// Per-game picks for a JSON-encoded request, returning JSON.
#[cfg(feature = "python")]
#[pyfunction]
fn predict_games_json(request_json: &str) -> PyResult<String> {
    let request: ParlayRequest = serde_json::from_str(request_json).map_err(to_py_err)?;
    let scored = score_candidates(&request, &EngineConfig::from_env()).map_err(to_py_err)?;
    serde_json::to_string(&predict_games(&scored)).map_err(to_py_err)
}

#[cfg(feature = "python")]
#[pyfunction]
fn american_to_decimal(american: i32) -> PyResult<f64> {
    odds::to_decimal(american).map_err(to_py_err)
}

#[cfg(feature = "python")]
#[pyfunction]
fn implied_probability(american: i32) -> PyResult<f64> {
    odds::implied_probability(american).map_err(to_py_err)
}

/// Risk band label for a posted price
#[cfg(feature = "python")]
#[pyfunction]
fn classify_risk(american: i32) -> PyResult<String> {
    risk_band::classify_strict(american)
        .map(|band| band.label().to_string())
        .map_err(to_py_err)
}

/// Python module definition
#[cfg(feature = "python")]
#[pymodule]
fn parlay_rust_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(build_parlay_json, m)?)?;
    m.add_function(wrap_pyfunction!(predict_games_json, m)?)?;
    m.add_function(wrap_pyfunction!(american_to_decimal, m)?)?;
    m.add_function(wrap_pyfunction!(implied_probability, m)?)?;
    m.add_function(wrap_pyfunction!(classify_risk, m)?)?;
    Ok(())
}
