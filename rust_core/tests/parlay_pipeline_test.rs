//! Parlay Pipeline Integration Tests
//!
//! Full request -> score -> select -> combine runs through the public API,
//! including the JSON request shape the builder service reads.

use chrono::{Duration, NaiveDate};
use parlay_rust_core::{
    build_parlay, build_parlays, predict_games, score_candidates, Constraints, EngineConfig,
    Market, ParlayError, ParlayRequest, Proposition, RiskBand, Side, StatKey, StatSample,
    StatsBook,
};

fn history(values: &[f64]) -> Vec<StatSample> {
    let last = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| StatSample::new(last - Duration::days(2 * i as i64), v))
        .collect()
}

fn prop(subject: &str, market: Market, line: f64, odds: i32, game: &str) -> Proposition {
    Proposition::new(subject, market, Some(line), odds, game).unwrap()
}

fn knicks_celtics_request() -> ParlayRequest {
    let mut stats = StatsBook::new();
    stats.insert(
        StatKey::new("Jalen Brunson", Market::Points),
        history(&[31.0, 27.0, 35.0, 24.0, 29.0, 33.0, 26.0, 30.0]),
    );
    stats.insert(
        StatKey::new("Josh Hart", Market::Rebounds),
        history(&[11.0, 9.0, 12.0, 8.0, 10.0, 13.0]),
    );
    stats.insert(
        StatKey::new("Jayson Tatum", Market::Assists),
        history(&[5.0, 7.0, 4.0, 6.0, 8.0]),
    );

    ParlayRequest {
        candidates: vec![
            prop("Jalen Brunson", Market::Points, 25.5, -220, "NYK@BOS"),
            prop("Josh Hart", Market::Rebounds, 8.5, -150, "NYK@BOS"),
            prop("Jayson Tatum", Market::Assists, 5.5, 120, "NYK@BOS"),
        ],
        stats,
        ..ParlayRequest::default()
    }
}

#[test]
fn test_two_favourites_combine_to_plus_142() {
    let mut request = knicks_celtics_request();
    request.constraints = Constraints {
        min_odds: -299,
        max_odds: -100,
        games: 1,
        props_per_game: 2,
        ..Constraints::default()
    };

    let result = build_parlay(&request, &EngineConfig::default()).unwrap();

    assert_eq!(result.len(), 2);
    let mut prices: Vec<i32> = result.legs.iter().map(|l| l.proposition().american_odds).collect();
    prices.sort();
    assert_eq!(prices, vec![-220, -150]);
    assert!((result.combined_decimal_odds - 2.4242).abs() < 1e-3);
    assert_eq!(result.combined_american_odds, 142);
    assert_eq!(result.risk_band, RiskBand::High);
    for leg in &result.legs {
        assert!((0.0..=100.0).contains(&leg.confidence()));
    }
}

#[test]
fn test_safe_band_window_leaves_one_leg() {
    let mut request = knicks_celtics_request();
    request.constraints = Constraints::for_band(RiskBand::Safe, 1, 2);

    // Only -220 falls in -299..=-200
    let err = build_parlay(&request, &EngineConfig::default()).unwrap_err();
    assert_eq!(err, ParlayError::InsufficientProps { requested: 2, available: 1 });
}

#[test]
fn test_diversification_shortfall() {
    let request = ParlayRequest {
        candidates: vec![
            prop("Jalen Brunson", Market::Points, 25.5, -120, "NYK@BOS"),
            prop("Jalen Brunson", Market::Points, 27.5, 105, "NYK@BOS"),
            prop("Josh Hart", Market::Rebounds, 8.5, -130, "NYK@BOS"),
        ],
        constraints: Constraints { props_per_game: 3, ..Constraints::default() },
        ..ParlayRequest::default()
    };

    let err = build_parlay(&request, &EngineConfig::default()).unwrap_err();
    assert!(err.is_insufficient());
    assert_eq!(err, ParlayError::InsufficientProps { requested: 3, available: 2 });
}

#[test]
fn test_oversized_request_rejected_before_scoring() {
    let mut malformed = prop("Jalen Brunson", Market::Points, 25.5, -110, "NYK@BOS");
    malformed.american_odds = 50;

    let request = ParlayRequest {
        candidates: vec![malformed],
        constraints: Constraints {
            games: 12,
            props_per_game: 4,
            total_cap: 24,
            ..Constraints::default()
        },
        ..ParlayRequest::default()
    };

    match build_parlay(&request, &EngineConfig::default()) {
        Err(ParlayError::Validation(msg)) => assert!(msg.contains("24")),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_multi_game_follows_caller_order() {
    let games = ["MIA@ORL", "LAL@DEN", "PHX@DAL"];
    let mut candidates = Vec::new();
    for game in games {
        candidates.push(prop(&format!("{} guard", game), Market::Points, 18.5, -125, game));
        candidates.push(prop(&format!("{} big", game), Market::Rebounds, 9.5, -140, game));
        candidates.push(prop(&format!("{} wing", game), Market::ThreesMade, 2.5, 140, game));
    }
    let game_order: Vec<String> = vec!["PHX@DAL".into(), "MIA@ORL".into(), "LAL@DEN".into()];
    let request = ParlayRequest {
        candidates,
        constraints: Constraints {
            games: 3,
            props_per_game: 2,
            total_cap: 6,
            game_order: game_order.clone(),
            ..Constraints::default()
        },
        ..ParlayRequest::default()
    };

    let result = build_parlay(&request, &EngineConfig::default()).unwrap();

    assert_eq!(result.len(), 6);
    let leg_games: Vec<&str> = result.legs.iter().map(|l| l.proposition().game_ref.as_str()).collect();
    assert_eq!(
        leg_games,
        vec!["PHX@DAL", "PHX@DAL", "MIA@ORL", "MIA@ORL", "LAL@DEN", "LAL@DEN"]
    );
    assert!(result.legs.iter().all(|l| l.proposition().american_odds <= 100));
}

#[test]
fn test_pool_spanning_too_few_games() {
    let mut request = knicks_celtics_request();
    request.constraints = Constraints {
        games: 2,
        props_per_game: 1,
        ..Constraints::default()
    };
    let err = build_parlay(&request, &EngineConfig::default()).unwrap_err();
    assert_eq!(err, ParlayError::InsufficientGames { requested: 2, available: 1 });
}

#[test]
fn test_single_leg_keeps_posted_price() {
    let mut request = knicks_celtics_request();
    request.constraints = Constraints {
        min_odds: -250,
        max_odds: -200,
        props_per_game: 1,
        ..Constraints::default()
    };
    let result = build_parlay(&request, &EngineConfig::default()).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.combined_american_odds, -220);
    assert_eq!(result.aggregate_confidence, result.legs[0].confidence());
}

#[test]
fn test_scores_bounded_and_repeatable() {
    let mut request = knicks_celtics_request();
    request.candidates.push(
        prop("Jalen Brunson", Market::Points, 40.5, 450, "NYK@BOS").with_side(Side::Under),
    );
    request.candidates.push(prop("Kristaps Porzingis", Market::Blocks, 1.5, 160, "NYK@BOS"));
    request.constraints.seed = 2025;

    let mut config = EngineConfig::default();
    config.scorer.monte_carlo_trials = 2_000;

    let first = score_candidates(&request, &config).unwrap();
    let second = score_candidates(&request, &config).unwrap();
    assert_eq!(first, second);
    for scored in &first {
        assert!((0.0..=100.0).contains(&scored.estimate.score));
        assert!(scored.estimate.component_scores.values().all(|v| (0.0..=100.0).contains(v)));
    }

    // No history for the blocks prop
    let blocks = first
        .iter()
        .find(|s| s.proposition.market == Market::Blocks)
        .unwrap();
    assert!(blocks.estimate.low_sample);
    assert!(blocks.estimate.component_scores.contains_key("implied"));
}

#[test]
fn test_request_from_json() {
    let raw = r#"{
        "candidates": [
            {"subject": "Celtics", "market": "moneyline", "american_odds": -180, "game_ref": "NYK@BOS"},
            {"subject": "Knicks", "market": "moneyline", "american_odds": 155, "game_ref": "NYK@BOS"},
            {"subject": "Knicks", "market": "spread", "line": 4.5, "american_odds": -110, "game_ref": "NYK@BOS"},
            {"subject": "NYK@BOS", "market": "total", "side": "under", "line": 221.5, "american_odds": -105, "game_ref": "NYK@BOS"}
        ],
        "stats": [
            {"subject": "Knicks", "market": "spread", "samples": [
                {"game_date": "2025-02-27", "value": -3.0},
                {"game_date": "2025-02-25", "value": 6.0},
                {"game_date": "2025-02-23", "value": -8.0}
            ]}
        ],
        "constraints": {"games": 1, "props_per_game": 2, "min_odds": -200, "max_odds": 200}
    }"#;

    let request: ParlayRequest = serde_json::from_str(raw).unwrap();
    assert_eq!(request.candidates.len(), 4);
    assert_eq!(request.candidates[3].side, Side::Under);
    assert_eq!(request.stats.get("Knicks", Market::Spread).len(), 3);

    let result = build_parlay(&request, &EngineConfig::default()).unwrap();
    assert_eq!(result.len(), 2);

    let scored = score_candidates(&request, &EngineConfig::default()).unwrap();
    let predictions = predict_games(&scored);
    assert_eq!(predictions.len(), 1);
    assert!(predictions[0].moneyline.is_some());
    assert!(predictions[0].spread.is_some());
    assert!(predictions[0].total.is_some());

    let encoded = serde_json::to_value(&result).unwrap();
    assert!(encoded["combined_american_odds"].is_i64());
    assert!(encoded["legs"].as_array().unwrap().len() == 2);
}

#[test]
fn test_batch_requests_are_independent() {
    let mut ok = knicks_celtics_request();
    ok.constraints.props_per_game = 2;
    ok.constraints.max_odds = -100;
    let mut bad = knicks_celtics_request();
    bad.constraints.games = 13;

    let results = build_parlays(&[ok, bad], &EngineConfig::default());
    assert_eq!(results[0].as_ref().unwrap().combined_american_odds, 142);
    assert!(matches!(results[1], Err(ParlayError::Validation(_))));
}

#[test]
fn test_long_shot_sgp_plus() {
    let markets = [Market::Points, Market::Rebounds, Market::Assists, Market::ThreesMade];
    let mut candidates = Vec::new();
    for game in ["MIA@ORL", "LAL@DEN"] {
        for market in markets {
            candidates.push(prop(&format!("{} bench", game), market, 30.5, 1000, game));
        }
    }
    let request = ParlayRequest {
        candidates,
        constraints: Constraints {
            min_odds: 251,
            max_odds: 5000,
            games: 2,
            props_per_game: 4,
            ..Constraints::default()
        },
        ..ParlayRequest::default()
    };

    let result = build_parlay(&request, &EngineConfig::default()).unwrap();
    assert_eq!(result.len(), 8);
    assert!((result.combined_decimal_odds - 214_358_881.0).abs() < 1e-3);
    assert_eq!(result.combined_american_odds, 21_435_888_000);
    assert_eq!(result.risk_band, RiskBand::VeryHigh);
}

#[test]
fn test_games_chosen_after_odds_filter() {
    let request = ParlayRequest {
        candidates: vec![
            prop("Paolo Banchero", Market::Points, 35.5, 300, "MIA@ORL"),
            prop("Nikola Jokic", Market::Rebounds, 11.5, -120, "LAL@DEN"),
        ],
        constraints: Constraints { games: 1, props_per_game: 1, ..Constraints::default() },
        ..ParlayRequest::default()
    };

    let result = build_parlay(&request, &EngineConfig::default()).unwrap();
    assert_eq!(result.legs[0].proposition().game_ref, "LAL@DEN");
}
