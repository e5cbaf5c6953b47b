//! Per-game picks for the moneyline, spread and total markets.
//!
//! For every game in a scored pool this picks the highest-confidence side of
//! each game market, attaches a vig-free fair probability where both sides
//! are priced, and flags the pick whose price diverges most from the model
//! as the sharp side.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::odds;
use crate::selector::ScoredProposition;
use crate::types::{Market, Side};

/// Minimum market-signal adjustment (score points) to call a side sharp
pub const SHARP_SIGNAL_THRESHOLD: f64 = 5.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GamePick {
    pub subject: String,
    pub market: Market,
    pub side: Side,
    pub line: Option<f64>,
    pub american_odds: i32,
    /// Probability with the bookmaker margin removed when both sides are priced
    pub fair_probability: f64,
    pub confidence: f64,
    pub market_signal: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GamePrediction {
    pub game_ref: String,
    pub moneyline: Option<GamePick>,
    pub spread: Option<GamePick>,
    pub total: Option<GamePick>,
    pub sharp_side: Option<GamePick>,
}

fn fair_probability(chosen: &ScoredProposition, market_pool: &[&ScoredProposition]) -> f64 {
    let implied = chosen.proposition.implied_probability().unwrap_or(0.0);
    if market_pool.len() != 2 {
        return implied;
    }
    let other = if std::ptr::eq(market_pool[0], chosen) {
        market_pool[1]
    } else {
        market_pool[0]
    };
    odds::remove_vig(chosen.proposition.american_odds, other.proposition.american_odds)
        .map(|(fair, _)| fair)
        .unwrap_or(implied)
}

fn pick_for(game_pool: &[&ScoredProposition], market: Market) -> Option<GamePick> {
    let market_pool: Vec<&ScoredProposition> = game_pool
        .iter()
        .copied()
        .filter(|s| s.proposition.market == market)
        .collect();

    let best = market_pool
        .iter()
        .copied()
        .max_by(|a, b| a.estimate.score.total_cmp(&b.estimate.score))?;

    Some(GamePick {
        subject: best.proposition.subject.clone(),
        market,
        side: best.proposition.side,
        line: best.proposition.line,
        american_odds: best.proposition.american_odds,
        fair_probability: fair_probability(best, &market_pool),
        confidence: best.estimate.score,
        market_signal: best.estimate.market_signal,
    })
}

/// Predictions for every game in the pool, in first-seen game order.
///
/// Player props in the pool are ignored.
pub fn predict_games(scored: &[ScoredProposition]) -> Vec<GamePrediction> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let games: Vec<&str> = scored
        .iter()
        .map(|s| s.proposition.game_ref.as_str())
        .filter(|g| seen.insert(*g))
        .collect();

    games
        .into_iter()
        .filter_map(|game| {
            let game_pool: Vec<&ScoredProposition> = scored
                .iter()
                .filter(|s| s.proposition.game_ref == game && s.proposition.market.is_game_market())
                .collect();
            if game_pool.is_empty() {
                return None;
            }

            let moneyline = pick_for(&game_pool, Market::Moneyline);
            let spread = pick_for(&game_pool, Market::Spread);
            let total = pick_for(&game_pool, Market::Total);

            let sharp_side = [&moneyline, &spread, &total]
                .into_iter()
                .flatten()
                .filter(|p| {
                    p.market_signal
                        .map(|s| s.abs() >= SHARP_SIGNAL_THRESHOLD)
                        .unwrap_or(false)
                })
                .max_by(|a, b| {
                    let a = a.market_signal.unwrap_or(0.0).abs();
                    let b = b.market_signal.unwrap_or(0.0).abs();
                    a.total_cmp(&b)
                })
                .cloned();

            Some(GamePrediction {
                game_ref: game.to_string(),
                moneyline,
                spread,
                total,
                sharp_side,
            })
        })
        .collect()
}
