//! End-to-end parlay pipeline.
//!
//! Stages always run in this order, with no backward transitions:
//! 1. Validate constraints (before any scoring work)
//! 2. Validate every candidate's odds
//! 3. Trend + confidence + risk band per candidate, one rayon task per game
//! 4. Select legs
//! 5. Combine into a [`ParlayResult`]
//!
//! Nothing here touches the network or any shared mutable state; every
//! request owns its inputs and outputs.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::combiner::{self, ParlayResult};
use crate::config::EngineConfig;
use crate::confidence::ConfidenceScorer;
use crate::error::Result;
use crate::selector::{self, Constraints, ScoredProposition};
use crate::trend;
use crate::types::{Market, Proposition, StatsBook};

/// Everything one parlay request needs, already fetched by collaborators.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParlayRequest {
    pub candidates: Vec<Proposition>,
    pub stats: StatsBook,
    /// League-relative allowed rate per market (1.0 = league average)
    pub opponent_defense: HashMap<Market, f64>,
    /// Per-game overrides of `opponent_defense`
    pub game_defense: HashMap<String, HashMap<Market, f64>>,
    pub constraints: Constraints,
}

impl ParlayRequest {
    /// Defensive rate that applies to a proposition, if any.
    fn allowed_rate(&self, prop: &Proposition) -> Option<f64> {
        self.game_defense
            .get(&prop.game_ref)
            .and_then(|rates| rates.get(&prop.market))
            .or_else(|| self.opponent_defense.get(&prop.market))
            .copied()
    }
}

/// Group candidates by game, preserving first-seen order.
fn group_by_game(candidates: &[Proposition]) -> Vec<(&str, Vec<&Proposition>)> {
    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    let mut groups: Vec<(&str, Vec<&Proposition>)> = Vec::new();
    for prop in candidates {
        let slot = *index.entry(prop.game_ref.as_str()).or_insert_with(|| {
            groups.push((prop.game_ref.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(prop);
    }
    groups
}

fn score_one(
    prop: &Proposition,
    request: &ParlayRequest,
    scorer: &ConfidenceScorer,
    config: &EngineConfig,
) -> Result<ScoredProposition> {
    let samples = request.stats.get(&prop.subject, prop.market);
    if samples.is_empty() && !prop.market.is_game_market() {
        warn!(
            subject = %prop.subject,
            market = %prop.market,
            "no stat history; scoring from price only"
        );
    }

    let summary = trend::summarize_with_min(
        samples,
        prop.threshold(),
        prop.effective_side(),
        config.trend_window,
        config.min_samples,
    );
    let estimate = scorer.score(
        prop,
        &summary,
        request.allowed_rate(prop),
        request.constraints.seed,
    )?;
    Ok(ScoredProposition::new(prop.clone(), estimate))
}

/// Score every candidate, fanning out one task per game.
///
/// Output order follows the first-seen game order of the pool, then the
/// pool order within a game, regardless of which task finishes first.
pub fn score_candidates(
    request: &ParlayRequest,
    config: &EngineConfig,
) -> Result<Vec<ScoredProposition>> {
    for prop in &request.candidates {
        prop.validate()?;
    }

    let scorer = ConfidenceScorer::new(config.scorer.clone());
    let groups = group_by_game(&request.candidates);

    let per_game: Vec<Result<Vec<ScoredProposition>>> = groups
        .par_iter()
        .map(|(game, props)| {
            debug!(game = %game, candidates = props.len(), "scoring game");
            props
                .iter()
                .map(|prop| score_one(prop, request, &scorer, config))
                .collect()
        })
        .collect();

    let mut scored = Vec::with_capacity(request.candidates.len());
    for game in per_game {
        scored.extend(game?);
    }
    Ok(scored)
}

/// Build a parlay from a fully-fetched request.
pub fn build_parlay(request: &ParlayRequest, config: &EngineConfig) -> Result<ParlayResult> {
    request.constraints.validate()?;

    let scored = score_candidates(request, config)?;
    let legs = selector::select(scored, &request.constraints)?;
    let result = combiner::combine(legs)?;

    info!(
        legs = result.len(),
        american = result.combined_american_odds,
        confidence = result.aggregate_confidence,
        "parlay built"
    );
    Ok(result)
}

/// Build many independent parlays in parallel.
///
/// Results line up with `requests`; one request failing does not affect
/// the others.
pub fn build_parlays(requests: &[ParlayRequest], config: &EngineConfig) -> Vec<Result<ParlayResult>> {
    requests
        .par_iter()
        .map(|request| build_parlay(request, config))
        .collect()
}
