use super::metrics::{compute_live_metrics, LiveMetrics};
use super::price_break::{detect_price_break, PriceBreak};
use crate::config::Config;
use crate::feed::live_state::{extract_game_state, GameState};
use crate::feed::pregame::{resolve_baseline, BaselineSource};
use crate::feed::types::{LivePayload, PregameExpectation, Sport};
use serde::Serialize;

/// Everything the live edge detector derived for one match in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeAnalysis {
    pub game_state: GameState,
    pub metrics: LiveMetrics,
    pub price_break: PriceBreak,
    pub recommendation: String,
    pub baseline: BaselineSource,
}

/// Raw payload in, edge bundle out. The payload's own sport wins over the
/// caller's when present.
pub fn analyze_edge(
    payload: &LivePayload,
    sport: Sport,
    pregame: Option<&PregameExpectation>,
    live_total: Option<f64>,
    config: &Config,
) -> EdgeAnalysis {
    let sport = payload.sport.filter(|s| *s != Sport::Other).unwrap_or(sport);
    let sport_cfg = config.sport(sport);
    let state = extract_game_state(payload, sport, &sport_cfg);
    let (baseline, source) = resolve_baseline(pregame, &payload.id, sport, config);
    evaluate_edge(state, &baseline, source, live_total, config)
}

/// Edge bundle from an already-built game state.
pub fn evaluate_edge(
    state: GameState,
    baseline: &PregameExpectation,
    source: BaselineSource,
    live_total: Option<f64>,
    config: &Config,
) -> EdgeAnalysis {
    let sport_cfg = config.sport(state.sport);
    let metrics = compute_live_metrics(&state, baseline, live_total, &sport_cfg);
    let price_break = detect_price_break(&state, &metrics, live_total, source, &config.edge, &sport_cfg);
    let recommendation = price_break.recommendation(live_total);
    if price_break.is_executable {
        tracing::info!(
            match_id = %baseline.match_id,
            direction = ?price_break.direction,
            edge = price_break.edge.unwrap_or(0.0),
            "executable price break"
        );
    }
    EdgeAnalysis {
        game_state: state,
        metrics,
        price_break,
        recommendation,
        baseline: source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::price_break::Direction;

    fn nba_payload() -> LivePayload {
        LivePayload {
            id: "g1".into(),
            status: "STATUS_IN_PROGRESS".into(),
            period: Some(2.0),
            display_clock: Some("0:00".into()),
            home_score: Some(60.0),
            away_score: Some(58.0),
            play_count: Some(52.0 * 2.2),
            ..Default::default()
        }
    }

    fn baseline() -> PregameExpectation {
        PregameExpectation {
            match_id: "g1".into(),
            expected_pace: 2.1,
            expected_efficiency: 1.1,
            expected_total: 224.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_payload_to_executable_over() {
        let config = Config::default();
        let a = analyze_edge(&nba_payload(), Sport::Nba, Some(&baseline()), Some(224.0), &config);
        assert_eq!(a.baseline, BaselineSource::Supplied);
        assert!((a.game_state.elapsed_minutes - 24.0).abs() < 1e-9);
        assert!((a.game_state.possessions - 52.0).abs() < 1e-6);
        assert!(a.price_break.is_executable);
        assert_eq!(a.price_break.direction, Some(Direction::Over));
        assert!(a.recommendation.starts_with("EXECUTE OVER"));
    }

    #[test]
    fn test_missing_baseline_still_computes() {
        let config = Config::default();
        let a = analyze_edge(&nba_payload(), Sport::Nba, None, Some(224.0), &config);
        assert_eq!(a.baseline, BaselineSource::SportDefault);
        assert!((a.metrics.p_expected - config.pregame_default(Sport::Nba).expected_pace).abs() < 1e-9);
        assert!(a.metrics.r_market.is_some());
    }

    #[test]
    fn test_payload_sport_overrides_caller() {
        let mut payload = nba_payload();
        payload.sport = Some(Sport::Ncaab);
        let a = analyze_edge(&payload, Sport::Nba, Some(&baseline()), Some(150.0), &Config::default());
        assert_eq!(a.game_state.sport, Sport::Ncaab);
        // Second half of a two-half game at 0:00 is the end of regulation.
        assert!((a.game_state.elapsed_minutes - 40.0).abs() < 1e-9);
    }
}
