//! Late-game script from the scoreboard margin. A lopsided final period
//! plays slower and less efficiently than the pregame projection assumed,
//! so the expected rates are rescaled by per-team blowout priors.

use super::market::Side;
use crate::config::SportConfig;
use crate::feed::live_state::GameState;
use crate::feed::types::{PregameExpectation, ScriptDelta};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "script", rename_all = "snake_case")]
pub enum GameScript {
    Blowout { leader: Side },
    Close,
    /// Between the two margins.
    Neutral,
}

/// Classify the margin once the game reaches its final regulation period.
/// None before then, or for sports without script thresholds.
pub fn classify_game_script(state: &GameState, sport: &SportConfig) -> Option<GameScript> {
    let (blowout, close) = (sport.blowout_margin?, sport.close_margin?);
    if state.period < sport.periods || state.is_final {
        return None;
    }
    let margin = state.home_score - state.away_score;
    Some(if margin.abs() >= blowout {
        let leader = if margin > 0.0 { Side::Home } else { Side::Away };
        GameScript::Blowout { leader }
    } else if margin.abs() <= close {
        GameScript::Close
    } else {
        GameScript::Neutral
    })
}

/// (pace, efficiency) multipliers for a blowout: the mean of the leader's
/// `leading` prior and the trailer's `trailing` prior, whichever exist.
pub fn blowout_multipliers(baseline: &PregameExpectation, leader: Side) -> Option<(f64, f64)> {
    let (lead, trail) = match leader {
        Side::Home => (&baseline.home_blowout, &baseline.away_blowout),
        Side::Away => (&baseline.away_blowout, &baseline.home_blowout),
    };
    let deltas: Vec<ScriptDelta> = [
        lead.as_ref().and_then(|p| p.leading),
        trail.as_ref().and_then(|p| p.trailing),
    ]
    .into_iter()
    .flatten()
    .filter(|d| d.pace_delta > 0.0 && d.ppp_delta > 0.0)
    .collect();
    if deltas.is_empty() {
        return None;
    }
    let n = deltas.len() as f64;
    Some((
        deltas.iter().map(|d| d.pace_delta).sum::<f64>() / n,
        deltas.iter().map(|d| d.ppp_delta).sum::<f64>() / n,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::types::{BlowoutPrior, Sport};

    fn state(period: u8, home: f64, away: f64) -> GameState {
        GameState {
            sport: Sport::Nba,
            home_score: home,
            away_score: away,
            total_score: home + away,
            period,
            elapsed_minutes: 38.0,
            remaining_minutes: 10.0,
            possessions: 80.0,
            possessions_estimated: false,
            is_live: true,
            is_final: false,
        }
    }

    fn delta(pace: f64, ppp: f64) -> Option<ScriptDelta> {
        Some(ScriptDelta { pace_delta: pace, ppp_delta: ppp })
    }

    #[test]
    fn test_script_thresholds() {
        let nba = SportConfig::builtin(Sport::Nba);
        assert_eq!(
            classify_game_script(&state(4, 95.0, 80.0), &nba),
            Some(GameScript::Blowout { leader: Side::Home })
        );
        assert_eq!(
            classify_game_script(&state(4, 70.0, 90.0), &nba),
            Some(GameScript::Blowout { leader: Side::Away })
        );
        assert_eq!(classify_game_script(&state(4, 90.0, 80.0), &nba), Some(GameScript::Close));
        assert_eq!(classify_game_script(&state(4, 92.0, 80.0), &nba), Some(GameScript::Neutral));
        // Margin before the final period does not count.
        assert_eq!(classify_game_script(&state(3, 95.0, 70.0), &nba), None);
    }

    #[test]
    fn test_no_script_without_thresholds() {
        let nfl = SportConfig::builtin(Sport::Nfl);
        assert_eq!(classify_game_script(&state(4, 35.0, 3.0), &nfl), None);
    }

    #[test]
    fn test_blowout_multipliers_average_both_sides() {
        let baseline = PregameExpectation {
            home_blowout: Some(BlowoutPrior { leading: delta(0.94, 0.96), trailing: delta(1.1, 1.1) }),
            away_blowout: Some(BlowoutPrior { leading: None, trailing: delta(0.98, 1.02) }),
            ..Default::default()
        };
        let (pace, ppp) = blowout_multipliers(&baseline, Side::Home).unwrap();
        assert!((pace - 0.96).abs() < 1e-9);
        assert!((ppp - 0.99).abs() < 1e-9);

        // Away leading: away has no leading prior, home trailing is used alone.
        let (pace, ppp) = blowout_multipliers(&baseline, Side::Away).unwrap();
        assert!((pace - 1.1).abs() < 1e-9);
        assert!((ppp - 1.1).abs() < 1e-9);

        assert_eq!(blowout_multipliers(&PregameExpectation::default(), Side::Home), None);
    }
}
