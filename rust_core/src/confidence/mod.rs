//! Confidence scoring for individual propositions.
//!
//! Several independent estimators each produce a probability that the
//! proposition hits. The applicable ones are averaged, scaled to 0-100,
//! penalised for thin history and clamped. Estimators that cannot run are
//! left out of the average entirely.
//!
//! Component names recorded on every estimate:
//! - `beta_bayes`: hit rate shrunk toward a prior
//! - `normal`: Normal(mean, stddev) tail past the line
//! - `poisson`: Poisson(mean) tail past the line (counting stats)
//! - `monte_carlo`: seeded simulation of the Normal model (opt-in)
//! - `implied`: book-implied probability (only when there is no history)
//! - `matchup`: base probability shifted for the opponent's defense
//! - `market_signal`: base probability nudged by unusual pricing

pub mod estimators;

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::config::ScorerConfig;
use crate::error::Result;
use crate::risk_band::{self, RiskBand};
use crate::trend::TrendSummary;
use crate::types::Proposition;

/// Score attached to one proposition for one evaluation pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceEstimate {
    /// 0-100; an engine heuristic, not a calibrated probability
    pub score: f64,
    /// Each estimator's vote on the same 0-100 scale
    pub component_scores: BTreeMap<String, f64>,
    pub risk_band: RiskBand,
    pub low_sample: bool,
    /// Adjustment applied by the market-signal estimator, in score points
    #[serde(default)]
    pub market_signal: Option<f64>,
}

/// Stateless scorer; cheap to clone and share across threads.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceScorer {
    config: ScorerConfig,
}

impl ConfidenceScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Score a proposition against its recent trend.
    ///
    /// `allowed_rate` is the opponent's league-relative rate for this market,
    /// when the defense collaborator supplied one. `seed` only matters when the
    /// Monte Carlo estimator is enabled.
    pub fn score(
        &self,
        prop: &Proposition,
        trend: &TrendSummary,
        allowed_rate: Option<f64>,
        seed: u64,
    ) -> Result<ConfidenceEstimate> {
        let implied = prop.implied_probability()?;
        let side = prop.effective_side();
        let threshold = prop.threshold();
        let cfg = &self.config;

        let mut components: BTreeMap<String, f64> = BTreeMap::new();
        let mut votes: Vec<f64> = Vec::with_capacity(6);

        // Stat-driven estimators
        if trend.sample_count > 0 {
            if let Some(p) = estimators::beta_posterior(
                trend.hits(),
                trend.sample_count,
                cfg.prior_mean,
                cfg.prior_weight,
            ) {
                components.insert("beta_bayes".to_string(), p * 100.0);
                votes.push(p);
            }

            if let Some(p) =
                estimators::normal_exceed(trend.recent_mean, trend.recent_stddev, threshold, side)
            {
                components.insert("normal".to_string(), p * 100.0);
                votes.push(p);
            }

            if prop.market.is_count_stat() {
                if let Some(p) = estimators::poisson_exceed(trend.recent_mean, threshold, side) {
                    components.insert("poisson".to_string(), p * 100.0);
                    votes.push(p);
                }
            }

            if let Some(p) = estimators::monte_carlo_exceed(
                trend.recent_mean,
                trend.recent_stddev,
                threshold,
                side,
                cfg.monte_carlo_trials,
                mix_seed(seed, prop),
            ) {
                components.insert("monte_carlo".to_string(), p * 100.0);
                votes.push(p);
            }
        }

        // Without history the price is the only evidence of the base rate
        if votes.is_empty() {
            components.insert("implied".to_string(), implied * 100.0);
            votes.push(implied);
        }

        let base = mean(&votes);

        if let Some(rate) = allowed_rate {
            if let Some(p) =
                estimators::matchup_adjusted(base, rate, cfg.matchup_sensitivity, side)
            {
                components.insert("matchup".to_string(), p * 100.0);
                votes.push(p);
            }
        }

        let market_signal = estimators::market_signal_points(
            implied,
            base,
            cfg.market_signal_threshold,
            cfg.market_signal_cap,
        );
        if let Some(points) = market_signal {
            let p = (base + points / 100.0).clamp(0.0, 1.0);
            components.insert("market_signal".to_string(), p * 100.0);
            votes.push(p);
        }

        let mut score = mean(&votes) * 100.0;
        if trend.low_sample {
            score -= cfg.low_sample_penalty;
        }
        let score = if score.is_finite() {
            score.clamp(0.0, 100.0)
        } else {
            0.0
        };

        Ok(ConfidenceEstimate {
            score,
            component_scores: components,
            risk_band: risk_band::classify(prop.american_odds),
            low_sample: trend.low_sample,
            market_signal,
        })
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Derive a per-proposition seed so legs don't share a random stream.
fn mix_seed(seed: u64, prop: &Proposition) -> u64 {
    let mut hasher = FxHasher::default();
    prop.subject.hash(&mut hasher);
    prop.market.hash(&mut hasher);
    prop.side.hash(&mut hasher);
    prop.line.map(f64::to_bits).hash(&mut hasher);
    prop.game_ref.hash(&mut hasher);
    seed ^ hasher.finish()
}
