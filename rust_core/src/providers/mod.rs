//! Collaborator abstractions for the data the engine consumes.
//!
//! The engine itself never does I/O. These traits describe what the
//! surrounding service fetches before calling
//! [`build_parlay`](crate::engine::build_parlay):
//! - Schedules: games on a date
//! - Pricing: propositions per (date, market) from an odds feed
//! - Stats: per-player game logs
//! - Defense: league-relative allowed rates per market for a game
//!
//! [`gather_request`] assembles a [`ParlayRequest`] from them. Stats and
//! defense failures for a single leg or game are logged and skipped.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rustc_hash::FxHashSet;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::engine::ParlayRequest;
use crate::selector::Constraints;
use crate::types::{GameInfo, Market, Proposition, StatKey, StatSample, StatsBook};

pub mod cache;

pub use cache::{DailyMarketKey, TtlCache};

/// Source of scheduled games
#[async_trait]
pub trait ScheduleProvider: Send + Sync {
    async fn games_on(&self, date: NaiveDate) -> Result<Vec<GameInfo>>;

    /// Provider name for logging and debugging
    fn provider_name(&self) -> &str;
}

/// Source of priced propositions (sportsbook odds feed)
#[async_trait]
pub trait PropositionProvider: Send + Sync {
    /// Every proposition for `market` across the games on `date`
    async fn propositions(&self, date: NaiveDate, market: Market) -> Result<Vec<Proposition>>;

    fn provider_name(&self) -> &str;
}

/// Source of historical game logs
#[async_trait]
pub trait StatsProvider: Send + Sync {
    /// Samples for a subject and market, most recent first
    async fn game_log(&self, subject: &str, market: Market) -> Result<Vec<StatSample>>;
}

/// Source of opponent defensive rates
#[async_trait]
pub trait DefenseProvider: Send + Sync {
    /// Allowed-stat rate per market relative to league average (1.0 = average)
    async fn allowed_rates(&self, game: &GameInfo) -> Result<HashMap<Market, f64>>;
}

/// Proposition provider wrapped in a `(date, market)` TTL cache.
///
/// Expired entries are purged whenever a fresh response is stored.
pub struct CachedPropositions<P> {
    inner: P,
    cache: TtlCache<DailyMarketKey, Vec<Proposition>>,
}

impl<P: PropositionProvider> CachedPropositions<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
        }
    }

    /// Cache sized by [`EngineConfig::cache_ttl`].
    pub fn from_config(inner: P, config: &EngineConfig) -> Self {
        Self::new(inner, config.cache_ttl)
    }

    pub fn cache(&self) -> &TtlCache<DailyMarketKey, Vec<Proposition>> {
        &self.cache
    }
}

#[async_trait]
impl<P: PropositionProvider> PropositionProvider for CachedPropositions<P> {
    async fn propositions(&self, date: NaiveDate, market: Market) -> Result<Vec<Proposition>> {
        let key = (date, market);
        if let Some(hit) = self.cache.get(&key) {
            debug!(%date, %market, "proposition cache hit");
            return Ok(hit);
        }
        let fresh = self.inner.propositions(date, market).await?;
        let purged = self.cache.purge_expired();
        if purged > 0 {
            debug!(purged, "dropped expired proposition entries");
        }
        self.cache.insert(key, fresh.clone());
        Ok(fresh)
    }

    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }
}

/// The collaborators one request is gathered from.
pub struct Sources<'a> {
    pub schedule: &'a dyn ScheduleProvider,
    pub propositions: &'a dyn PropositionProvider,
    pub stats: &'a dyn StatsProvider,
    pub defense: Option<&'a dyn DefenseProvider>,
}

/// Resolve which scheduled games the request covers, in the caller's order.
fn resolve_games(scheduled: Vec<GameInfo>, selected: &[String], date: NaiveDate) -> Result<Vec<GameInfo>> {
    if selected.is_empty() {
        return Ok(scheduled);
    }
    selected
        .iter()
        .map(|id| {
            scheduled
                .iter()
                .find(|g| &g.game_id == id)
                .cloned()
                .ok_or_else(|| anyhow!("game {} is not scheduled on {}", id, date))
        })
        .collect()
}

/// Fetch everything a parlay request needs for the games on `date`.
///
/// `selected_games` restricts and orders the games (empty = every game on
/// the schedule). Pricing failures are fatal; missing stats or defensive
/// rates only degrade the affected legs.
pub async fn gather_request(
    sources: &Sources<'_>,
    date: NaiveDate,
    selected_games: &[String],
    markets: &[Market],
    mut constraints: Constraints,
) -> Result<ParlayRequest> {
    let scheduled = sources
        .schedule
        .games_on(date)
        .await
        .with_context(|| format!("{} schedule for {}", sources.schedule.provider_name(), date))?;
    let games = resolve_games(scheduled, selected_games, date)?;
    if games.is_empty() {
        bail!("no games scheduled on {}", date);
    }
    let game_ids: FxHashSet<&str> = games.iter().map(|g| g.game_id.as_str()).collect();

    let mut candidates: Vec<Proposition> = Vec::new();
    for &market in markets {
        let priced = sources
            .propositions
            .propositions(date, market)
            .await
            .with_context(|| {
                format!(
                    "{} {} prices for {}",
                    sources.propositions.provider_name(),
                    market,
                    date
                )
            })?;
        for prop in priced {
            if !game_ids.contains(prop.game_ref.as_str()) {
                continue;
            }
            match prop.validate() {
                Ok(()) => candidates.push(prop),
                Err(e) => warn!(subject = %prop.subject, %market, error = %e, "dropping malformed proposition"),
            }
        }
    }

    let mut stats = StatsBook::new();
    let mut wanted: FxHashSet<StatKey> = FxHashSet::default();
    for prop in &candidates {
        if prop.market.is_count_stat() {
            wanted.insert(prop.stat_key());
        }
    }
    for key in wanted {
        match sources.stats.game_log(&key.subject, key.market).await {
            Ok(samples) => stats.insert(key, samples),
            Err(e) => warn!(subject = %key.subject, market = %key.market, error = %e, "stat history unavailable"),
        }
    }

    let mut game_defense: HashMap<String, HashMap<Market, f64>> = HashMap::new();
    if let Some(defense) = sources.defense {
        for game in &games {
            match defense.allowed_rates(game).await {
                Ok(rates) => {
                    game_defense.insert(game.game_id.clone(), rates);
                }
                Err(e) => warn!(game = %game.game_id, error = %e, "defensive rates unavailable"),
            }
        }
    }

    if constraints.game_order.is_empty() && constraints.games == games.len() {
        constraints.game_order = games.iter().map(|g| g.game_id.clone()).collect();
    }

    debug!(
        games = games.len(),
        candidates = candidates.len(),
        stat_series = stats.len(),
        "gathered parlay request"
    );

    Ok(ParlayRequest {
        candidates,
        stats,
        opponent_defense: HashMap::new(),
        game_defense,
        constraints,
    })
}
