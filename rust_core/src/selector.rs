//! Constrained selection of parlay legs from a scored candidate pool.
//!
//! Selection runs in four steps:
//! 1. Keep candidates priced inside `[min_odds, max_odds]`
//! 2. Group by game
//! 3. Per game, take the highest-confidence candidates, at most one per
//!    (subject, market) pair, up to `props_per_game`
//! 4. Concatenate games in the requested order (or the first games of the
//!    filtered pool that fill their quota) and cap at `total_cap`
//!
//! A request that cannot be filled is an error, never a shorter parlay.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use tracing::debug;

use crate::combiner::ParlayLeg;
use crate::confidence::ConfidenceEstimate;
use crate::error::{ParlayError, Result};
use crate::risk_band::RiskBand;
use crate::types::{Market, Proposition};

/// Most games a multi-game parlay may span
pub const MAX_GAMES: usize = 12;

/// Most legs taken from a single game
pub const MAX_PROPS_PER_GAME: usize = 8;

/// Hard ceiling on parlay legs
pub const DEFAULT_TOTAL_CAP: usize = 24;

/// Default odds window for candidate props
pub const DEFAULT_MIN_ODDS: i32 = -250;
pub const DEFAULT_MAX_ODDS: i32 = 100;

/// Caller constraints for one parlay request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    pub min_odds: i32,
    pub max_odds: i32,
    /// 1 for a same-game parlay, 2-12 for multi-game
    pub games: usize,
    pub props_per_game: usize,
    pub total_cap: usize,
    /// Seed for simulation-based estimators
    pub seed: u64,
    /// Games in presentation order; empty means first-seen order of the pool
    pub game_order: Vec<String>,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            min_odds: DEFAULT_MIN_ODDS,
            max_odds: DEFAULT_MAX_ODDS,
            games: 1,
            props_per_game: 3,
            total_cap: DEFAULT_TOTAL_CAP,
            seed: 0,
            game_order: Vec::new(),
        }
    }
}

impl Constraints {
    /// Constraints whose odds window is exactly one risk band.
    pub fn for_band(band: RiskBand, games: usize, props_per_game: usize) -> Self {
        let (min_odds, max_odds) = band.odds_range();
        Self {
            min_odds,
            max_odds,
            games,
            props_per_game,
            ..Self::default()
        }
    }

    /// Check the request shape before any scoring work is done.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_GAMES).contains(&self.games) {
            return Err(ParlayError::validation(format!(
                "games must be between 1 and {}, got {}",
                MAX_GAMES, self.games
            )));
        }
        if !(1..=MAX_PROPS_PER_GAME).contains(&self.props_per_game) {
            return Err(ParlayError::validation(format!(
                "props_per_game must be between 1 and {}, got {}",
                MAX_PROPS_PER_GAME, self.props_per_game
            )));
        }
        if self.total_cap == 0 {
            return Err(ParlayError::validation("total_cap must be at least 1"));
        }
        if self.games * self.props_per_game > self.total_cap {
            return Err(ParlayError::validation(format!(
                "{} games x {} props per game exceeds total cap of {}",
                self.games, self.props_per_game, self.total_cap
            )));
        }
        if self.min_odds > self.max_odds {
            return Err(ParlayError::validation(format!(
                "min_odds {} is greater than max_odds {}",
                self.min_odds, self.max_odds
            )));
        }
        if !self.game_order.is_empty() {
            if self.game_order.len() != self.games {
                return Err(ParlayError::validation(format!(
                    "game_order lists {} games but {} were requested",
                    self.game_order.len(),
                    self.games
                )));
            }
            let unique: FxHashSet<&str> = self.game_order.iter().map(|g| g.as_str()).collect();
            if unique.len() != self.game_order.len() {
                return Err(ParlayError::validation("game_order contains duplicates"));
            }
        }
        Ok(())
    }

    fn accepts(&self, american_odds: i32) -> bool {
        (self.min_odds..=self.max_odds).contains(&american_odds)
    }
}

/// Candidate with its confidence estimate attached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredProposition {
    pub proposition: Proposition,
    pub estimate: ConfidenceEstimate,
}

impl ScoredProposition {
    pub fn new(proposition: Proposition, estimate: ConfidenceEstimate) -> Self {
        Self {
            proposition,
            estimate,
        }
    }

    /// Ranking: higher confidence first, then the shorter (safer) price.
    fn rank(&self, other: &Self) -> Ordering {
        other
            .estimate
            .score
            .total_cmp(&self.estimate.score)
            .then_with(|| {
                let mine = self.proposition.implied_probability().unwrap_or(0.0);
                let theirs = other.proposition.implied_probability().unwrap_or(0.0);
                theirs.total_cmp(&mine)
            })
    }
}

/// Pick the best diversified candidates for one game.
fn select_for_game(
    mut candidates: Vec<ScoredProposition>,
    props_per_game: usize,
) -> Vec<ScoredProposition> {
    candidates.sort_by(|a, b| a.rank(b));

    let mut used: FxHashSet<(String, Market)> = FxHashSet::default();
    let mut picked = Vec::with_capacity(props_per_game);
    for candidate in candidates {
        if picked.len() == props_per_game {
            break;
        }
        let key = (
            candidate.proposition.subject.clone(),
            candidate.proposition.market,
        );
        if used.insert(key) {
            picked.push(candidate);
        }
    }
    picked
}

/// Fill every game in the caller's order; any shortfall is an error.
fn fill_ordered_games(
    game_order: &[String],
    mut by_game: FxHashMap<String, Vec<ScoredProposition>>,
    props_per_game: usize,
) -> Result<Vec<Vec<ScoredProposition>>> {
    let mut filled = Vec::with_capacity(game_order.len());
    for game in game_order {
        let picked = select_for_game(by_game.remove(game).unwrap_or_default(), props_per_game);
        if picked.len() < props_per_game {
            debug!(game = %game, available = picked.len(), "game cannot fill its quota");
            return Err(ParlayError::InsufficientProps {
                requested: props_per_game,
                available: picked.len(),
            });
        }
        filled.push(picked);
    }
    Ok(filled)
}

/// Fill the first `games` eligible games in first-seen order.
///
/// Games that cannot fill their quota are passed over. When too few games
/// qualify, a props shortfall is reported if any game came up short (with
/// the best count seen), otherwise a games shortfall.
fn fill_first_seen_games(
    seen: Vec<String>,
    mut by_game: FxHashMap<String, Vec<ScoredProposition>>,
    constraints: &Constraints,
) -> Result<Vec<Vec<ScoredProposition>>> {
    let mut filled = Vec::with_capacity(constraints.games);
    let mut best_short: Option<usize> = None;
    for game in seen {
        if filled.len() == constraints.games {
            break;
        }
        let picked = select_for_game(
            by_game.remove(&game).unwrap_or_default(),
            constraints.props_per_game,
        );
        if picked.len() < constraints.props_per_game {
            debug!(game = %game, available = picked.len(), "skipping game short of its quota");
            best_short = Some(best_short.map_or(picked.len(), |b| b.max(picked.len())));
            continue;
        }
        filled.push(picked);
    }

    if filled.len() < constraints.games {
        return Err(match best_short {
            Some(available) => ParlayError::InsufficientProps {
                requested: constraints.props_per_game,
                available,
            },
            None => ParlayError::InsufficientGames {
                requested: constraints.games,
                available: filled.len(),
            },
        });
    }
    Ok(filled)
}

/// Select parlay legs from a scored pool.
///
/// Fails with [`ParlayError::InsufficientProps`] when a game cannot supply
/// `props_per_game` in-range, diversified legs, and with
/// [`ParlayError::InsufficientGames`] when too few games have any.
/// With an explicit `game_order` every listed game must fill its quota;
/// otherwise the first qualifying games of the filtered pool are used.
pub fn select(pool: Vec<ScoredProposition>, constraints: &Constraints) -> Result<Vec<ParlayLeg>> {
    constraints.validate()?;

    let total = pool.len();
    let mut seen: Vec<String> = Vec::new();
    let mut by_game: FxHashMap<String, Vec<ScoredProposition>> = FxHashMap::default();
    for candidate in pool {
        if !constraints.accepts(candidate.proposition.american_odds) {
            continue;
        }
        match by_game.entry(candidate.proposition.game_ref.clone()) {
            Entry::Occupied(mut slot) => slot.get_mut().push(candidate),
            Entry::Vacant(slot) => {
                seen.push(slot.key().clone());
                slot.insert(vec![candidate]);
            }
        }
    }
    debug!(
        candidates = total,
        in_range = by_game.values().map(Vec::len).sum::<usize>(),
        games = seen.len(),
        min_odds = constraints.min_odds,
        max_odds = constraints.max_odds,
        "filtered candidate pool"
    );

    let filled = if constraints.game_order.is_empty() {
        fill_first_seen_games(seen, by_game, constraints)?
    } else {
        fill_ordered_games(&constraints.game_order, by_game, constraints.props_per_game)?
    };

    let mut legs: Vec<ParlayLeg> = filled
        .into_iter()
        .flatten()
        .map(ParlayLeg::from)
        .collect();

    if legs.len() > constraints.total_cap {
        debug!(legs = legs.len(), cap = constraints.total_cap, "truncating to total cap");
        legs.truncate(constraints.total_cap);
    }
    Ok(legs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk_band;
    use std::collections::BTreeMap;

    fn scored(subject: &str, market: Market, odds: i32, score: f64, game: &str) -> ScoredProposition {
        let prop = Proposition::new(subject, market, Some(10.5), odds, game).unwrap();
        ScoredProposition::new(
            prop,
            ConfidenceEstimate {
                score,
                component_scores: BTreeMap::new(),
                risk_band: risk_band::classify(odds),
                low_sample: false,
                market_signal: None,
            },
        )
    }

    #[test]
    fn test_validation_rejects_bad_shapes() {
        let bad = [
            Constraints { games: 0, ..Constraints::default() },
            Constraints { games: 13, ..Constraints::default() },
            Constraints { props_per_game: 0, ..Constraints::default() },
            Constraints { props_per_game: 9, ..Constraints::default() },
            Constraints { total_cap: 0, ..Constraints::default() },
            Constraints { min_odds: 100, max_odds: -100, ..Constraints::default() },
            Constraints { games: 12, props_per_game: 4, total_cap: 24, ..Constraints::default() },
            Constraints { games: 2, game_order: vec!["a".into()], ..Constraints::default() },
            Constraints {
                games: 2,
                game_order: vec!["a".into(), "a".into()],
                ..Constraints::default()
            },
        ];
        for c in bad {
            assert!(
                matches!(c.validate(), Err(ParlayError::Validation(_))),
                "{:?} should be rejected",
                c
            );
        }
        assert!(Constraints { games: 12, props_per_game: 2, ..Constraints::default() }
            .validate()
            .is_ok());
    }

    #[test]
    fn test_filters_by_odds_window() {
        let pool = vec![
            scored("A", Market::Points, -220, 70.0, "g1"),
            scored("B", Market::Points, -150, 65.0, "g1"),
            scored("C", Market::Points, 120, 90.0, "g1"),
        ];
        let constraints = Constraints {
            min_odds: -299,
            max_odds: -100,
            props_per_game: 2,
            ..Constraints::default()
        };
        let legs = select(pool, &constraints).unwrap();
        let odds: Vec<i32> = legs.iter().map(|l| l.proposition().american_odds).collect();
        assert_eq!(odds, vec![-220, -150]);
    }

    #[test]
    fn test_diversifies_markets_per_subject() {
        let pool = vec![
            scored("Brunson", Market::Points, -110, 80.0, "g1"),
            scored("Brunson", Market::Points, -140, 78.0, "g1"),
            scored("Brunson", Market::Assists, -110, 60.0, "g1"),
            scored("Tatum", Market::Points, -110, 55.0, "g1"),
        ];
        let constraints = Constraints { props_per_game: 3, ..Constraints::default() };
        let legs = select(pool, &constraints).unwrap();
        let picks: Vec<(&str, Market)> = legs
            .iter()
            .map(|l| (l.proposition().subject.as_str(), l.proposition().market))
            .collect();
        assert_eq!(
            picks,
            vec![
                ("Brunson", Market::Points),
                ("Brunson", Market::Assists),
                ("Tatum", Market::Points)
            ]
        );
        assert_eq!(legs[0].proposition().american_odds, -110);
    }

    #[test]
    fn test_insufficient_diversified_markets() {
        let pool = vec![
            scored("Brunson", Market::Points, -110, 80.0, "g1"),
            scored("Brunson", Market::Points, -130, 75.0, "g1"),
            scored("Brunson", Market::Rebounds, -110, 70.0, "g1"),
        ];
        let constraints = Constraints { games: 1, props_per_game: 3, ..Constraints::default() };
        assert_eq!(
            select(pool, &constraints).unwrap_err(),
            ParlayError::InsufficientProps { requested: 3, available: 2 }
        );
    }

    #[test]
    fn test_tie_break_prefers_shorter_price() {
        let pool = vec![
            scored("A", Market::Points, -105, 70.0, "g1"),
            scored("B", Market::Points, -180, 70.0, "g1"),
        ];
        let constraints = Constraints { props_per_game: 1, ..Constraints::default() };
        let legs = select(pool, &constraints).unwrap();
        assert_eq!(legs[0].proposition().subject, "B");
    }

    #[test]
    fn test_caps_per_game_and_follows_game_order() {
        let mut pool = Vec::new();
        for game in ["g1", "g2", "g3"] {
            for (i, market) in [Market::Points, Market::Rebounds, Market::Assists, Market::Steals]
                .into_iter()
                .enumerate()
            {
                pool.push(scored("P", market, -120, 60.0 - i as f64, game));
            }
        }
        let constraints = Constraints {
            games: 2,
            props_per_game: 3,
            game_order: vec!["g3".into(), "g1".into()],
            ..Constraints::default()
        };
        let legs = select(pool, &constraints).unwrap();
        assert_eq!(legs.len(), 6);
        let games: Vec<&str> = legs.iter().map(|l| l.proposition().game_ref.as_str()).collect();
        assert_eq!(games, vec!["g3", "g3", "g3", "g1", "g1", "g1"]);

        for game in ["g1", "g3"] {
            assert!(games.iter().filter(|g| **g == game).count() <= constraints.props_per_game);
        }
    }

    #[test]
    fn test_out_of_range_game_does_not_take_a_slot() {
        let pool = vec![
            scored("A", Market::Points, 300, 90.0, "g1"),
            scored("B", Market::Points, -120, 60.0, "g2"),
        ];
        let constraints = Constraints { games: 1, props_per_game: 1, ..Constraints::default() };
        let legs = select(pool, &constraints).unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].proposition().game_ref, "g2");
    }

    #[test]
    fn test_short_game_passed_over_without_order() {
        let pool = vec![
            scored("A", Market::Points, -110, 90.0, "g1"),
            scored("A", Market::Points, -130, 85.0, "g1"),
            scored("B", Market::Points, -120, 60.0, "g2"),
            scored("C", Market::Rebounds, -115, 55.0, "g2"),
        ];
        let constraints = Constraints { games: 1, props_per_game: 2, ..Constraints::default() };
        let legs = select(pool.clone(), &constraints).unwrap();
        assert!(legs.iter().all(|l| l.proposition().game_ref == "g2"));

        // Naming the short game explicitly still fails
        let pinned = Constraints { game_order: vec!["g1".into()], ..constraints };
        assert_eq!(
            select(pool, &pinned).unwrap_err(),
            ParlayError::InsufficientProps { requested: 2, available: 1 }
        );
    }

    #[test]
    fn test_too_few_games() {
        let pool = vec![scored("A", Market::Points, -120, 60.0, "g1")];
        let constraints = Constraints { games: 2, props_per_game: 1, ..Constraints::default() };
        let err = select(pool, &constraints).unwrap_err();
        assert_eq!(err, ParlayError::InsufficientGames { requested: 2, available: 1 });
        assert!(err.is_insufficient());
    }

    #[test]
    fn test_ordered_game_with_no_candidates() {
        let pool = vec![scored("A", Market::Points, -120, 60.0, "g1")];
        let constraints = Constraints {
            games: 2,
            props_per_game: 1,
            game_order: vec!["g1".into(), "g9".into()],
            ..Constraints::default()
        };
        assert_eq!(
            select(pool, &constraints).unwrap_err(),
            ParlayError::InsufficientProps { requested: 1, available: 0 }
        );
    }

    #[test]
    fn test_for_band() {
        let c = Constraints::for_band(RiskBand::Safe, 1, 2);
        assert_eq!((c.min_odds, c.max_odds), (-299, -200));
        assert!(c.validate().is_ok());
    }
}
