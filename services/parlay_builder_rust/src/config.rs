use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;

use parlay_rust_core::RiskBand;

#[derive(Debug, Clone)]
pub struct Config {
    pub request_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub include_predictions: bool,
    pub pretty: bool,
    /// Replaces the request's odds window with this band's range
    pub risk_band: Option<RiskBand>,
}

impl Config {
    /// Load from the environment; the first CLI argument overrides
    /// `PARLAY_REQUEST_PATH`.
    pub fn from_env(cli_path: Option<String>) -> Result<Self> {
        let request_path = cli_path
            .or_else(|| env::var("PARLAY_REQUEST_PATH").ok())
            .map(PathBuf::from)
            .ok_or_else(|| {
                anyhow!("request path missing: pass it as the first argument or set PARLAY_REQUEST_PATH")
            })?;

        let output_path = env::var("PARLAY_OUTPUT_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let include_predictions = parse_bool_env("PARLAY_INCLUDE_PREDICTIONS", true);
        let pretty = parse_bool_env("PARLAY_PRETTY", true);

        let risk_band = match env::var("PARLAY_RISK_BAND") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                raw.parse::<RiskBand>()
                    .with_context(|| format!("Invalid PARLAY_RISK_BAND: {raw}"))?,
            ),
            _ => None,
        };

        Ok(Self {
            request_path,
            output_path,
            include_predictions,
            pretty,
            risk_band,
        })
    }
}

fn parse_bool_env(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "y" | "on"))
        .unwrap_or(default)
}
