use super::game_script::{blowout_multipliers, classify_game_script, GameScript};
use crate::config::SportConfig;
use crate::feed::live_state::GameState;
use crate::feed::types::PregameExpectation;
use serde::Serialize;

/// Scoring-rate readings for one live cycle. Rates are points per minute,
/// pace is possessions per minute, efficiency is points per possession.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveMetrics {
    pub p_live: f64,
    pub e_live: f64,
    pub r_real: f64,
    pub p_expected: f64,
    pub e_expected: f64,
    pub r_expected: f64,
    /// Rate the live total implies for the rest of the game. None without a
    /// live total or once the clock has run out.
    pub r_market: Option<f64>,
    pub pace_delta: f64,
    pub efficiency_delta: f64,
    /// R_real - R_expected.
    pub expected_delta: f64,
    /// R_real - R_market.
    pub market_delta: Option<f64>,
    pub stability_score: f64,
    pub is_stable: bool,
    pub game_script: Option<GameScript>,
    /// Expected pace and efficiency were rescaled by blowout priors.
    pub script_adjusted: bool,
}

pub fn compute_live_metrics(
    state: &GameState,
    baseline: &PregameExpectation,
    live_total: Option<f64>,
    sport: &SportConfig,
) -> LiveMetrics {
    let p_live = state.possessions / state.elapsed_minutes;
    let e_live = state.total_score / state.possessions;
    let r_real = state.total_score / state.elapsed_minutes;

    let game_script = classify_game_script(state, sport);
    let multipliers = match game_script {
        Some(GameScript::Blowout { leader }) => blowout_multipliers(baseline, leader),
        _ => None,
    };
    let (pace_mult, ppp_mult) = multipliers.unwrap_or((1.0, 1.0));
    let p_expected = baseline.expected_pace * pace_mult;
    let e_expected = baseline.expected_efficiency * ppp_mult;
    let r_expected = p_expected * e_expected;

    // A non-positive total is no market at all.
    let r_market = match live_total {
        Some(total) if state.remaining_minutes > 0.0 && total > 0.0 && total.is_finite() => {
            Some((total - state.total_score) / state.remaining_minutes)
        }
        _ => None,
    };

    let threshold = sport.min_possessions_for_stability;
    let (is_stable, stability_score) = if threshold > 0.0 {
        (
            state.possessions >= threshold,
            (state.possessions / (2.0 * threshold)).min(1.0),
        )
    } else {
        (true, 1.0)
    };

    LiveMetrics {
        p_live,
        e_live,
        r_real,
        p_expected,
        e_expected,
        r_expected,
        r_market,
        pace_delta: p_live - p_expected,
        efficiency_delta: e_live - e_expected,
        expected_delta: r_real - r_expected,
        market_delta: r_market.map(|m| r_real - m),
        stability_score,
        is_stable,
        game_script,
        script_adjusted: multipliers.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::market::Side;
    use crate::feed::types::{BlowoutPrior, ScriptDelta, Sport};

    fn state(elapsed: f64, remaining: f64, possessions: f64, total: f64) -> GameState {
        GameState {
            sport: Sport::Nba,
            home_score: total / 2.0,
            away_score: total / 2.0,
            total_score: total,
            period: 3,
            elapsed_minutes: elapsed,
            remaining_minutes: remaining,
            possessions,
            possessions_estimated: false,
            is_live: true,
            is_final: false,
        }
    }

    fn baseline(pace: f64, efficiency: f64) -> PregameExpectation {
        PregameExpectation {
            match_id: "m1".into(),
            expected_pace: pace,
            expected_efficiency: efficiency,
            ..Default::default()
        }
    }

    #[test]
    fn test_rates_at_halftime() {
        let cfg = SportConfig::builtin(Sport::Nba);
        let m = compute_live_metrics(&state(24.0, 24.0, 52.0, 118.0), &baseline(2.1, 1.1), Some(224.0), &cfg);
        assert!((m.p_live - 52.0 / 24.0).abs() < 1e-9);
        assert!((m.e_live - 118.0 / 52.0).abs() < 1e-9);
        assert!((m.r_real - 118.0 / 24.0).abs() < 1e-9);
        assert!((m.r_expected - 2.31).abs() < 1e-9);
        assert!((m.r_market.unwrap() - 106.0 / 24.0).abs() < 1e-9);
        assert!((m.market_delta.unwrap() - 0.5).abs() < 1e-9);
        assert!(m.is_stable);
        assert_eq!(m.stability_score, 1.0);
    }

    #[test]
    fn test_stability_threshold() {
        let cfg = SportConfig::builtin(Sport::Nba);
        let m = compute_live_metrics(&state(6.0, 42.0, 19.0, 30.0), &baseline(2.1, 1.1), None, &cfg);
        assert!(!m.is_stable);
        assert!((m.stability_score - 19.0 / 40.0).abs() < 1e-9);

        let m = compute_live_metrics(&state(6.0, 42.0, 20.0, 30.0), &baseline(2.1, 1.1), None, &cfg);
        assert!(m.is_stable);
        assert!((m.stability_score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_no_market_rate_without_total_or_time() {
        let cfg = SportConfig::builtin(Sport::Nba);
        let m = compute_live_metrics(&state(24.0, 24.0, 52.0, 118.0), &baseline(2.1, 1.1), None, &cfg);
        assert_eq!(m.r_market, None);
        assert_eq!(m.market_delta, None);

        let m = compute_live_metrics(&state(48.0, 0.0, 100.0, 230.0), &baseline(2.1, 1.1), Some(228.5), &cfg);
        assert_eq!(m.r_market, None);

        for total in [0.0, -5.0] {
            let m = compute_live_metrics(&state(24.0, 24.0, 52.0, 118.0), &baseline(2.1, 1.1), Some(total), &cfg);
            assert_eq!(m.r_market, None);
            assert_eq!(m.market_delta, None);
        }
    }

    #[test]
    fn test_blowout_rescales_expected_rates() {
        let cfg = SportConfig::builtin(Sport::Nba);
        let mut s = state(40.0, 8.0, 84.0, 180.0);
        s.period = 4;
        s.home_score = 100.0;
        s.away_score = 80.0;
        let mut b = baseline(2.1, 1.1);
        b.home_blowout = Some(BlowoutPrior {
            leading: Some(ScriptDelta { pace_delta: 0.9, ppp_delta: 0.95 }),
            trailing: None,
        });

        let m = compute_live_metrics(&s, &b, Some(215.0), &cfg);
        assert_eq!(m.game_script, Some(GameScript::Blowout { leader: Side::Home }));
        assert!(m.script_adjusted);
        assert!((m.p_expected - 2.1 * 0.9).abs() < 1e-9);
        assert!((m.e_expected - 1.1 * 0.95).abs() < 1e-9);
        assert!((m.r_expected - 2.1 * 0.9 * 1.1 * 0.95).abs() < 1e-9);

        // Same margin without priors keeps the pregame rates.
        let m = compute_live_metrics(&s, &baseline(2.1, 1.1), Some(215.0), &cfg);
        assert_eq!(m.game_script, Some(GameScript::Blowout { leader: Side::Home }));
        assert!(!m.script_adjusted);
        assert!((m.p_expected - 2.1).abs() < 1e-9);

        // A close fourth quarter never rescales.
        s.away_score = 95.0;
        let m = compute_live_metrics(&s, &b, Some(215.0), &cfg);
        assert_eq!(m.game_script, Some(GameScript::Close));
        assert!(!m.script_adjusted);
    }
}
