//! Engine configuration with environment overrides.
//!
//! This module manages the scoring tunables:
//! - Beta prior for the hit-rate estimator
//! - Low-sample penalty and threshold
//! - Matchup and market-signal sensitivities
//! - Optional seeded Monte Carlo estimator
//! - Collaborator cache TTL

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::trend::{TrendWindow, DEFAULT_MIN_SAMPLES};

/// Prior hit rate for the Beta estimator
pub const DEFAULT_PRIOR_MEAN: f64 = 0.6;

/// Prior weight in pseudo-games
pub const DEFAULT_PRIOR_WEIGHT: f64 = 10.0;

/// Points subtracted from the score when the trend is built from too few games
pub const DEFAULT_LOW_SAMPLE_PENALTY: f64 = 15.0;

/// Probability shift per unit of league-relative defensive rate
pub const DEFAULT_MATCHUP_SENSITIVITY: f64 = 0.5;

/// Market-signal adjustment bound, in score points
pub const DEFAULT_MARKET_SIGNAL_CAP: f64 = 10.0;

/// Gap between implied and model probability before the market signal fires
pub const DEFAULT_MARKET_SIGNAL_THRESHOLD: f64 = 0.05;

/// Collaborator cache lifetime (one hour, matching the odds feed refresh)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Tunables for the confidence scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    pub prior_mean: f64,
    pub prior_weight: f64,
    pub low_sample_penalty: f64,
    pub matchup_sensitivity: f64,
    pub market_signal_cap: f64,
    pub market_signal_threshold: f64,
    /// Draws for the Monte Carlo estimator; 0 disables it
    pub monte_carlo_trials: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            prior_mean: DEFAULT_PRIOR_MEAN,
            prior_weight: DEFAULT_PRIOR_WEIGHT,
            low_sample_penalty: DEFAULT_LOW_SAMPLE_PENALTY,
            matchup_sensitivity: DEFAULT_MATCHUP_SENSITIVITY,
            market_signal_cap: DEFAULT_MARKET_SIGNAL_CAP,
            market_signal_threshold: DEFAULT_MARKET_SIGNAL_THRESHOLD,
            monte_carlo_trials: 0,
        }
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scorer: ScorerConfig,
    pub trend_window: TrendWindow,
    pub min_samples: usize,
    #[serde(with = "duration_secs")]
    pub cache_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scorer: ScorerConfig::default(),
            trend_window: TrendWindow::default(),
            min_samples: DEFAULT_MIN_SAMPLES,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl EngineConfig {
    /// Load configuration from `PARLAY_*` environment variables with defaults
    pub fn from_env() -> Self {
        let scorer = ScorerConfig {
            prior_mean: env_f64("PARLAY_PRIOR_MEAN", DEFAULT_PRIOR_MEAN).clamp(0.01, 0.99),
            prior_weight: env_f64("PARLAY_PRIOR_WEIGHT", DEFAULT_PRIOR_WEIGHT).max(0.0),
            low_sample_penalty: env_f64("PARLAY_LOW_SAMPLE_PENALTY", DEFAULT_LOW_SAMPLE_PENALTY)
                .clamp(0.0, 100.0),
            matchup_sensitivity: env_f64("PARLAY_MATCHUP_SENSITIVITY", DEFAULT_MATCHUP_SENSITIVITY)
                .max(0.0),
            market_signal_cap: env_f64("PARLAY_MARKET_SIGNAL_CAP", DEFAULT_MARKET_SIGNAL_CAP)
                .clamp(0.0, DEFAULT_MARKET_SIGNAL_CAP),
            market_signal_threshold: env_f64(
                "PARLAY_MARKET_SIGNAL_THRESHOLD",
                DEFAULT_MARKET_SIGNAL_THRESHOLD,
            )
            .max(0.0),
            monte_carlo_trials: env::var("PARLAY_MONTE_CARLO_TRIALS")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(0),
        };

        let trend_window = env::var("PARLAY_TREND_WINDOW")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .and_then(|games| TrendWindow::try_from(games).ok())
            .unwrap_or_default();

        let min_samples = env::var("PARLAY_MIN_SAMPLES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MIN_SAMPLES);

        let cache_ttl = Duration::from_secs(
            env::var("PARLAY_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(DEFAULT_CACHE_TTL_SECS),
        );

        Self {
            scorer,
            trend_window,
            min_samples,
            cache_ttl,
        }
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
