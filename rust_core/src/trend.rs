//! Recent-form summaries over a player's (or team's) last N games.

use serde::{Deserialize, Serialize};

use crate::error::{ParlayError, Result};
use crate::types::{Side, StatSample};

/// Below this many samples a trend is flagged `low_sample`.
pub const DEFAULT_MIN_SAMPLES: usize = 2;

/// Lookback windows offered for recent form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum TrendWindow {
    Last5,
    #[default]
    Last10,
    Last15,
}

impl TrendWindow {
    pub const ALL: [TrendWindow; 3] = [TrendWindow::Last5, TrendWindow::Last10, TrendWindow::Last15];

    pub fn games(&self) -> usize {
        match self {
            TrendWindow::Last5 => 5,
            TrendWindow::Last10 => 10,
            TrendWindow::Last15 => 15,
        }
    }
}

impl TryFrom<usize> for TrendWindow {
    type Error = ParlayError;

    fn try_from(games: usize) -> Result<Self> {
        match games {
            5 => Ok(TrendWindow::Last5),
            10 => Ok(TrendWindow::Last10),
            15 => Ok(TrendWindow::Last15),
            other => Err(ParlayError::validation(format!(
                "trend window must be 5, 10 or 15 games, got {}",
                other
            ))),
        }
    }
}

impl From<TrendWindow> for usize {
    fn from(window: TrendWindow) -> Self {
        window.games()
    }
}

/// Statistical summary of the samples inside one window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub window: TrendWindow,
    pub sample_count: usize,
    pub recent_mean: f64,
    /// Population standard deviation; 0 when fewer than two samples
    pub recent_stddev: f64,
    /// Fraction of samples on the hitting side of `threshold`
    pub hit_rate: f64,
    pub threshold: f64,
    pub low_sample: bool,
}

impl TrendSummary {
    /// Summary with no history behind it.
    pub fn empty(window: TrendWindow, threshold: f64) -> Self {
        Self {
            window,
            sample_count: 0,
            recent_mean: 0.0,
            recent_stddev: 0.0,
            hit_rate: 0.0,
            threshold,
            low_sample: true,
        }
    }

    /// Number of samples that hit.
    pub fn hits(&self) -> f64 {
        self.hit_rate * self.sample_count as f64
    }
}

/// Summarise the most recent `window` samples against `threshold`.
///
/// `samples` must be ordered most recent first. Over counts values strictly
/// above the threshold as hits; Under counts values strictly below.
pub fn summarize(
    samples: &[StatSample],
    threshold: f64,
    side: Side,
    window: TrendWindow,
) -> TrendSummary {
    summarize_with_min(samples, threshold, side, window, DEFAULT_MIN_SAMPLES)
}

/// [`summarize`] with a configurable `low_sample` threshold.
pub fn summarize_with_min(
    samples: &[StatSample],
    threshold: f64,
    side: Side,
    window: TrendWindow,
    min_samples: usize,
) -> TrendSummary {
    let values: Vec<f64> = samples
        .iter()
        .map(|s| s.value)
        .filter(|v| v.is_finite())
        .take(window.games())
        .collect();

    if values.is_empty() {
        return TrendSummary::empty(window, threshold);
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let stddev = if values.len() < 2 {
        0.0
    } else {
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
    };

    let hits = values
        .iter()
        .filter(|&&v| match side {
            Side::Over => v > threshold,
            Side::Under => v < threshold,
        })
        .count();

    TrendSummary {
        window,
        sample_count: values.len(),
        recent_mean: mean,
        recent_stddev: stddev,
        hit_rate: hits as f64 / n,
        threshold,
        low_sample: values.len() < min_samples.max(DEFAULT_MIN_SAMPLES),
    }
}

/// Summaries for the 5, 10 and 15 game windows, in that order.
pub fn summarize_all_windows(samples: &[StatSample], threshold: f64, side: Side) -> Vec<TrendSummary> {
    TrendWindow::ALL
        .iter()
        .map(|&window| summarize(samples, threshold, side, window))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn samples(values: &[f64]) -> Vec<StatSample> {
        let start = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| StatSample::new(start - chrono::Duration::days(i as i64), v))
            .collect()
    }

    #[test]
    fn test_window_uses_most_recent_samples() {
        let s = samples(&[30.0, 20.0, 10.0, 10.0, 10.0, 50.0, 50.0]);
        let t = summarize(&s, 15.0, Side::Over, TrendWindow::Last5);
        assert_eq!(t.sample_count, 5);
        assert!((t.recent_mean - 16.0).abs() < 1e-12);
        assert!((t.hit_rate - 0.4).abs() < 1e-12);
        assert!(!t.low_sample);
    }

    #[test]
    fn test_population_stddev() {
        let s = samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let t = summarize(&s, 0.0, Side::Over, TrendWindow::Last10);
        assert!((t.recent_mean - 5.0).abs() < 1e-12);
        assert!((t.recent_stddev - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_sample_is_low_sample() {
        let t = summarize(&samples(&[12.0]), 10.5, Side::Over, TrendWindow::Last5);
        assert_eq!(t.recent_stddev, 0.0);
        assert!(t.low_sample);
        assert_eq!(t.hit_rate, 1.0);
    }

    #[test]
    fn test_empty_window() {
        let t = summarize(&[], 10.5, Side::Over, TrendWindow::Last15);
        assert_eq!(t.sample_count, 0);
        assert_eq!(t.hit_rate, 0.0);
        assert!(t.low_sample);
    }

    #[test]
    fn test_under_side_and_pushes() {
        let s = samples(&[8.0, 10.0, 12.0, 10.0]);
        let over = summarize(&s, 10.0, Side::Over, TrendWindow::Last5);
        let under = summarize(&s, 10.0, Side::Under, TrendWindow::Last5);
        assert_eq!(over.hit_rate, 0.25);
        assert_eq!(under.hit_rate, 0.25);
    }

    #[test]
    fn test_non_finite_samples_skipped() {
        let s = samples(&[f64::NAN, 10.0, 20.0]);
        let t = summarize(&s, 12.0, Side::Over, TrendWindow::Last5);
        assert_eq!(t.sample_count, 2);
        assert_eq!(t.recent_mean, 15.0);
    }

    #[test]
    fn test_configurable_min_samples() {
        let s = samples(&[10.0, 11.0, 12.0]);
        let t = summarize_with_min(&s, 9.5, Side::Over, TrendWindow::Last10, 5);
        assert!(t.low_sample);
    }

    #[test]
    fn test_all_windows() {
        let s = samples(&(0..20).map(|i| i as f64).collect::<Vec<_>>());
        let all = summarize_all_windows(&s, 3.5, Side::Over);
        let counts: Vec<usize> = all.iter().map(|t| t.sample_count).collect();
        assert_eq!(counts, vec![5, 10, 15]);
    }

    #[test]
    fn test_window_from_size() {
        assert_eq!(TrendWindow::try_from(15).unwrap(), TrendWindow::Last15);
        assert!(TrendWindow::try_from(7).is_err());
        let w: TrendWindow = serde_json::from_str("5").unwrap();
        assert_eq!(w, TrendWindow::Last5);
        assert!(serde_json::from_str::<TrendWindow>("6").is_err());
    }
}
