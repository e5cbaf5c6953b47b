//! Parlay Builder Rust Service
//!
//! Runs one parlay request end to end.
//!
//! This service:
//! - Loads a JSON `ParlayRequest` prepared by the data collaborators
//! - Scores, selects and combines legs with `parlay_rust_core`
//! - Optionally adds per-game moneyline/spread/total picks
//! - Writes the JSON result to stdout or `PARLAY_OUTPUT_PATH`

mod config;

use anyhow::{Context, Result};
use chrono::Utc;
use dotenv::dotenv;
use log::{info, warn};
use serde::Serialize;
use std::env;
use std::fs;

use config::Config;
use parlay_rust_core::{
    build_parlay, predict_games, score_candidates, Constraints, EngineConfig, GamePrediction,
    ParlayRequest, ParlayResult,
};

#[derive(Debug, Serialize)]
struct BuildOutput {
    generated_at: String,
    parlay: ParlayResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    predictions: Vec<GamePrediction>,
}

fn load_request(config: &Config) -> Result<ParlayRequest> {
    let raw = fs::read_to_string(&config.request_path)
        .with_context(|| format!("reading {}", config.request_path.display()))?;
    let mut request: ParlayRequest = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", config.request_path.display()))?;

    if let Some(band) = config.risk_band {
        let (min_odds, max_odds) = band.odds_range();
        info!("Restricting legs to {} odds ({} to {})", band, min_odds, max_odds);
        request.constraints = Constraints {
            min_odds,
            max_odds,
            ..request.constraints
        };
    }
    Ok(request)
}

fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    info!("Starting Parlay Builder Rust Service...");

    let config = Config::from_env(env::args().nth(1))?;
    let engine_config = EngineConfig::from_env();
    let request = load_request(&config)?;

    info!(
        "Loaded {} candidates for {} game(s) x {} prop(s)",
        request.candidates.len(),
        request.constraints.games,
        request.constraints.props_per_game
    );

    let parlay = build_parlay(&request, &engine_config).context("building parlay")?;
    info!(
        "Built {}-leg parlay at {:+} ({}), confidence {:.1}",
        parlay.len(),
        parlay.combined_american_odds,
        parlay.risk_band,
        parlay.aggregate_confidence
    );

    let predictions = if config.include_predictions {
        match score_candidates(&request, &engine_config) {
            Ok(scored) => predict_games(&scored),
            Err(e) => {
                warn!("Skipping game predictions: {}", e);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let output = BuildOutput {
        generated_at: Utc::now().to_rfc3339(),
        parlay,
        predictions,
    };
    let json = if config.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };

    match &config.output_path {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote result to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
