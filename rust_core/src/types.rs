//! Native Rust types for propositions and historical stat samples.
//!
//! These are the records the collaborator layer hands to the engine. They are
//! validated once at that boundary and never mutated by the core.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ParlayError, Result};
use crate::odds;

/// Betting market a proposition is priced on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    Points,
    Rebounds,
    Assists,
    ThreesMade,
    Steals,
    Blocks,
    PointsReboundsAssists,
    Moneyline,
    Spread,
    Total,
}

impl Market {
    /// Markets priced on the game outcome rather than a single player's stat line.
    pub fn is_game_market(&self) -> bool {
        matches!(self, Market::Moneyline | Market::Spread | Market::Total)
    }

    /// Per-player counting stats, where a Poisson model is a reasonable fit.
    pub fn is_count_stat(&self) -> bool {
        !self.is_game_market()
    }

    /// Market key as used by sportsbook odds feeds.
    pub fn feed_key(&self) -> &'static str {
        match self {
            Market::Points => "player_points",
            Market::Rebounds => "player_rebounds",
            Market::Assists => "player_assists",
            Market::ThreesMade => "player_threes",
            Market::Steals => "player_steals",
            Market::Blocks => "player_blocks",
            Market::PointsReboundsAssists => "player_points_rebounds_assists",
            Market::Moneyline => "h2h",
            Market::Spread => "spreads",
            Market::Total => "totals",
        }
    }

    pub const ALL: [Market; 10] = [
        Market::Points,
        Market::Rebounds,
        Market::Assists,
        Market::ThreesMade,
        Market::Steals,
        Market::Blocks,
        Market::PointsReboundsAssists,
        Market::Moneyline,
        Market::Spread,
        Market::Total,
    ];
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Market::Points => "Points",
            Market::Rebounds => "Rebounds",
            Market::Assists => "Assists",
            Market::ThreesMade => "Threes Made",
            Market::Steals => "Steals",
            Market::Blocks => "Blocks",
            Market::PointsReboundsAssists => "Points + Rebounds + Assists",
            Market::Moneyline => "Moneyline",
            Market::Spread => "Spread",
            Market::Total => "Total",
        };
        f.write_str(name)
    }
}

impl FromStr for Market {
    type Err = ParlayError;

    /// Accepts both feed keys (`player_points`, `h2h`) and snake_case names.
    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        Market::ALL
            .iter()
            .copied()
            .find(|m| {
                m.feed_key() == key
                    || serde_json::to_value(m)
                        .ok()
                        .and_then(|v| v.as_str().map(|name| name == key))
                        .unwrap_or(false)
            })
            .ok_or_else(|| ParlayError::validation(format!("unknown market: {}", s)))
    }
}

/// Which side of the line a proposition takes.
///
/// Moneyline and spread propositions always back `subject`; they use `Over`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Over,
    Under,
}

/// One candidate bet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proposition {
    /// Player name or team identifier
    pub subject: String,
    pub market: Market,
    #[serde(default)]
    pub side: Side,
    /// Threshold; `None` for moneyline
    #[serde(default)]
    pub line: Option<f64>,
    pub american_odds: i32,
    /// Opaque reference to the game this proposition belongs to
    pub game_ref: String,
}

impl Proposition {
    /// Build a validated proposition on the `Over` side.
    pub fn new(
        subject: impl Into<String>,
        market: Market,
        line: Option<f64>,
        american_odds: i32,
        game_ref: impl Into<String>,
    ) -> Result<Self> {
        let prop = Self {
            subject: subject.into(),
            market,
            side: Side::Over,
            line,
            american_odds,
            game_ref: game_ref.into(),
        };
        prop.validate()?;
        Ok(prop)
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    /// Check the record-level invariants.
    pub fn validate(&self) -> Result<()> {
        odds::validate_american(self.american_odds)?;

        if self.subject.trim().is_empty() {
            return Err(ParlayError::validation("proposition subject is empty"));
        }
        if self.game_ref.trim().is_empty() {
            return Err(ParlayError::validation(format!(
                "proposition for {} has no game reference",
                self.subject
            )));
        }
        match (self.market, self.line) {
            (_, Some(line)) if !line.is_finite() => Err(ParlayError::validation(format!(
                "{} {} line is not finite",
                self.subject, self.market
            ))),
            (Market::Moneyline, _) => Ok(()),
            (market, None) => Err(ParlayError::validation(format!(
                "{} {} requires a line",
                self.subject, market
            ))),
            _ => Ok(()),
        }
    }

    /// Value a stat sample must beat (or stay under) for this proposition to hit.
    ///
    /// Spread lines are handicaps added to the subject's margin, so the margin
    /// must exceed the negated line. Moneyline samples are margins against zero.
    pub fn threshold(&self) -> f64 {
        match (self.market, self.line) {
            (Market::Spread, Some(line)) => -line,
            (_, Some(line)) => line,
            (_, None) => 0.0,
        }
    }

    /// Side used when comparing samples against [`Self::threshold`].
    pub fn effective_side(&self) -> Side {
        match self.market {
            Market::Moneyline | Market::Spread => Side::Over,
            _ => self.side,
        }
    }

    pub fn stat_key(&self) -> StatKey {
        StatKey::new(self.subject.clone(), self.market)
    }

    pub fn decimal_odds(&self) -> Result<f64> {
        odds::to_decimal(self.american_odds)
    }

    pub fn implied_probability(&self) -> Result<f64> {
        odds::implied_probability(self.american_odds)
    }
}

/// One historical game's value for a (subject, market) pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatSample {
    pub game_date: NaiveDate,
    pub value: f64,
}

impl StatSample {
    pub fn new(game_date: NaiveDate, value: f64) -> Self {
        Self { game_date, value }
    }
}

/// Lookup key for a stat history.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatKey {
    pub subject: String,
    pub market: Market,
}

impl StatKey {
    pub fn new(subject: impl Into<String>, market: Market) -> Self {
        Self {
            subject: subject.into(),
            market,
        }
    }
}

/// Serialized form of one stat history entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatSeries {
    pub subject: String,
    pub market: Market,
    /// Most recent first
    pub samples: Vec<StatSample>,
}

/// Stat histories keyed by (subject, market).
///
/// Serializes as a list of [`StatSeries`] so requests stay plain JSON.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "Vec<StatSeries>", into = "Vec<StatSeries>")]
pub struct StatsBook {
    series: FxHashMap<StatKey, Vec<StatSample>>,
}

impl StatsBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a history, ordering it most recent first.
    pub fn insert(&mut self, key: StatKey, mut samples: Vec<StatSample>) {
        samples.sort_by(|a, b| b.game_date.cmp(&a.game_date));
        self.series.insert(key, samples);
    }

    /// History for a key, most recent first. Empty when unknown.
    pub fn get(&self, subject: &str, market: Market) -> &[StatSample] {
        self.series
            .get(&StatKey::new(subject, market))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl From<Vec<StatSeries>> for StatsBook {
    fn from(series: Vec<StatSeries>) -> Self {
        let mut book = StatsBook::new();
        for s in series {
            book.insert(StatKey::new(s.subject, s.market), s.samples);
        }
        book
    }
}

impl From<StatsBook> for Vec<StatSeries> {
    fn from(book: StatsBook) -> Self {
        let mut series: Vec<StatSeries> = book
            .series
            .into_iter()
            .map(|(key, samples)| StatSeries {
                subject: key.subject,
                market: key.market,
                samples,
            })
            .collect();
        series.sort_by(|a, b| a.subject.cmp(&b.subject).then(a.market.cmp(&b.market)));
        series
    }
}

/// Scheduled game as reported by the schedule collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameInfo {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    pub date: NaiveDate,
}
