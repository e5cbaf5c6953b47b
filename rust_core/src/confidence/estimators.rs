//! Individual probability-of-hit estimators.
//!
//! Each returns `Some(p)` with `p` in [0, 1], or `None` when its inputs
//! cannot support it. Callers must drop `None` rather than treat it as zero.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::Side;

/// Standard normal CDF approximation (Abramowitz-Stegun)
/// Accurate to ~1e-7
pub fn normal_cdf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let z = x.abs() / std::f64::consts::SQRT_2;

    let t = 1.0 / (1.0 + p * z);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-z * z).exp();

    0.5 * (1.0 + sign * y)
}

/// Posterior mean of a Beta prior updated with the observed hits.
///
/// With no samples this is the prior mean, so callers normally skip it then.
pub fn beta_posterior(hits: f64, samples: usize, prior_mean: f64, prior_weight: f64) -> Option<f64> {
    let denom = prior_weight + samples as f64;
    if denom <= 0.0 {
        return None;
    }
    Some(((prior_mean * prior_weight + hits) / denom).clamp(0.0, 1.0))
}

/// Probability that a Normal(mean, stddev) draw lands on the hitting side.
pub fn normal_exceed(mean: f64, stddev: f64, threshold: f64, side: Side) -> Option<f64> {
    if !(stddev > 0.0) || !mean.is_finite() {
        return None;
    }
    let z = (threshold - mean) / stddev;
    let p = match side {
        Side::Over => 1.0 - normal_cdf(z),
        Side::Under => normal_cdf(z),
    };
    Some(p.clamp(0.0, 1.0))
}

/// Above this rate the Poisson CDF uses the normal approximation.
const POISSON_EXACT_MAX_RATE: f64 = 1_000.0;

/// Poisson CDF `P(X <= k)`.
///
/// Work is bounded by the rate, never by `k`: counts far past the mean
/// return 1.0 directly, and large rates use the normal approximation with
/// continuity correction. The exact sum runs in log space so it doesn't
/// underflow.
fn poisson_cdf(lambda: f64, k: f64) -> f64 {
    if k < 0.0 {
        return 0.0;
    }
    if k > lambda + 40.0 * lambda.sqrt() + 40.0 {
        return 1.0;
    }
    if lambda > POISSON_EXACT_MAX_RATE {
        return normal_cdf((k + 0.5 - lambda) / lambda.sqrt());
    }

    let ln_lambda = lambda.ln();
    let mut ln_pmf = -lambda;
    let mut total = 0.0;
    let mut i = 0.0;
    while i <= k {
        total += ln_pmf.exp();
        i += 1.0;
        ln_pmf += ln_lambda - i.ln();
    }
    total.min(1.0)
}

/// Probability that a Poisson(lambda) count lands on the hitting side.
///
/// Over means strictly above the threshold, Under strictly below.
pub fn poisson_exceed(lambda: f64, threshold: f64, side: Side) -> Option<f64> {
    if !(lambda > 0.0) || !lambda.is_finite() || !threshold.is_finite() {
        return None;
    }
    let p = match side {
        Side::Over => 1.0 - poisson_cdf(lambda, threshold.floor()),
        Side::Under => poisson_cdf(lambda, threshold.ceil() - 1.0),
    };
    Some(p.clamp(0.0, 1.0))
}

/// Shift a base probability by the opponent's league-relative allowed rate.
///
/// A rate of 1.0 is league average; above 1.0 the defense concedes more
/// than average and the probability rises.
pub fn matchup_adjusted(base: f64, allowed_rate: f64, sensitivity: f64, side: Side) -> Option<f64> {
    if !allowed_rate.is_finite() || allowed_rate <= 0.0 {
        return None;
    }
    let direction = match side {
        Side::Over => 1.0,
        Side::Under => -1.0,
    };
    let shifted = base + direction * (allowed_rate - 1.0) * sensitivity;
    Some(shifted.clamp(0.01, 0.99))
}

/// Score-point adjustment implied by the posted price.
///
/// When the book prices a leg noticeably shorter than the model (implied
/// probability above base), the price is treated as informed money and the
/// adjustment is positive; noticeably longer pricing pulls it down.
/// Returns `None` when the gap is below `threshold`.
pub fn market_signal_points(implied: f64, base: f64, threshold: f64, cap: f64) -> Option<f64> {
    let gap = implied - base;
    if !gap.is_finite() || gap.abs() < threshold {
        return None;
    }
    Some((gap * 100.0 * 0.5).clamp(-cap, cap))
}

/// Fraction of seeded Normal draws landing on the hitting side.
///
/// Uses Box-Muller on a request-scoped generator; identical seeds give
/// identical results.
pub fn monte_carlo_exceed(
    mean: f64,
    stddev: f64,
    threshold: f64,
    side: Side,
    trials: usize,
    seed: u64,
) -> Option<f64> {
    if trials == 0 || !(stddev > 0.0) || !mean.is_finite() {
        return None;
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut hits = 0usize;
    for _ in 0..trials {
        let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = rng.gen();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        let draw = mean + stddev * z;
        let hit = match side {
            Side::Over => draw > threshold,
            Side::Under => draw < threshold,
        };
        if hit {
            hits += 1;
        }
    }
    Some(hits as f64 / trials as f64)
}
