use super::types::{LivePayload, Slate, Sport};
use crate::config::SportConfig;
use crate::engine::status::{classify_status_in_play, MatchPhase};
use serde::Serialize;
use std::collections::HashMap;

/// Floors that keep the per-minute rates finite at tip-off.
pub const MIN_ELAPSED_MINUTES: f64 = 0.5;
pub const MIN_POSSESSIONS: f64 = 1.0;

/// Canonical in-play state for one match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameState {
    pub sport: Sport,
    pub home_score: f64,
    pub away_score: f64,
    pub total_score: f64,
    pub period: u8,
    pub elapsed_minutes: f64,
    pub remaining_minutes: f64,
    pub possessions: f64,
    /// Possessions came from the pace estimator, not the feed.
    pub possessions_estimated: bool,
    pub is_live: bool,
    pub is_final: bool,
}

/// Minutes left on a period clock.
/// Accepts "MM:SS", "M:SS.s" and ISO-8601 "PT05M30.00S"; a bare number is
/// read as minutes.
pub fn parse_clock(clock: &str) -> Option<f64> {
    let clock = clock.trim();
    if clock.is_empty() {
        return None;
    }
    let minutes = if let Some(iso) = clock.strip_prefix("PT") {
        let iso = iso.trim_end_matches('S');
        let (min_str, sec_str) = iso.split_once('M').unwrap_or(("0", iso));
        let min: f64 = min_str.parse().ok()?;
        let sec: f64 = if sec_str.is_empty() { 0.0 } else { sec_str.parse().ok()? };
        min + sec / 60.0
    } else if let Some((min_str, sec_str)) = clock.split_once(':') {
        let min: f64 = min_str.trim().parse().ok()?;
        let sec: f64 = sec_str.trim().parse().ok()?;
        min + sec / 60.0
    } else {
        clock.parse().ok()?
    };
    (minutes.is_finite() && minutes >= 0.0).then_some(minutes)
}

fn phase_of(payload: &LivePayload) -> MatchPhase {
    let started = payload.period.is_some_and(|p| p >= 1.0)
        || payload.home_score.unwrap_or(0.0) + payload.away_score.unwrap_or(0.0) > 0.0;
    match classify_status_in_play(&payload.status, started) {
        // No status but a running period: the feed only reports in-play games.
        MatchPhase::Scheduled
            if payload.status.trim().is_empty() && payload.period.is_some_and(|p| p >= 1.0) =>
        {
            MatchPhase::Live
        }
        phase => phase,
    }
}

/// (elapsed, remaining) minutes from period and clock.
fn clock_minutes(payload: &LivePayload, cfg: &SportConfig) -> (f64, f64) {
    let regulation = cfg.regulation_minutes();
    let period = payload.period.unwrap_or(1.0).max(1.0).floor();

    if cfg.minute_clock {
        let elapsed = payload
            .minute
            .unwrap_or_else(|| (period - 1.0) * cfg.minutes_per_period);
        return (elapsed, (regulation - elapsed).max(0.0));
    }

    let periods = cfg.periods as f64;
    if period <= periods {
        // Missing clock reads as the start of the period.
        let left = payload
            .display_clock
            .as_deref()
            .and_then(parse_clock)
            .unwrap_or(cfg.minutes_per_period)
            .min(cfg.minutes_per_period);
        let elapsed = (period - 1.0) * cfg.minutes_per_period + (cfg.minutes_per_period - left);
        (elapsed, regulation - elapsed)
    } else {
        let ot_len = if cfg.overtime_minutes > 0.0 {
            cfg.overtime_minutes
        } else {
            cfg.minutes_per_period
        };
        let left = payload
            .display_clock
            .as_deref()
            .and_then(parse_clock)
            .unwrap_or(ot_len)
            .min(ot_len);
        let ot_index = period - periods;
        let elapsed = regulation + (ot_index - 1.0) * ot_len + (ot_len - left);
        (elapsed, left)
    }
}

fn extracted_possessions(payload: &LivePayload, sport: Sport, cfg: &SportConfig) -> Option<f64> {
    if sport.is_football() {
        let split = match (payload.home_drives, payload.away_drives) {
            (None, None) => None,
            (h, a) => Some(h.unwrap_or(0.0) + a.unwrap_or(0.0)),
        };
        return payload.drives.or(split);
    }
    if sport.is_basketball() {
        return Some(payload.play_count? / cfg.play_divisor?);
    }
    None
}

fn estimate_possessions(elapsed: f64, cfg: &SportConfig) -> f64 {
    let mut possessions = elapsed * cfg.base_pace * 2.0;
    if let (Some(after), Some(multiplier)) = (cfg.late_game_after_minutes, cfg.late_game_multiplier) {
        if elapsed > after {
            possessions *= multiplier;
        }
    }
    possessions
}

pub fn extract_game_state(payload: &LivePayload, sport: Sport, cfg: &SportConfig) -> GameState {
    let phase = phase_of(payload);
    let home_score = payload.home_score.unwrap_or(0.0);
    let away_score = payload.away_score.unwrap_or(0.0);

    let (mut elapsed, mut remaining) = clock_minutes(payload, cfg);
    if phase == MatchPhase::Final {
        elapsed = elapsed.max(cfg.regulation_minutes());
        remaining = 0.0;
    }
    let elapsed = elapsed.max(MIN_ELAPSED_MINUTES);
    let remaining = remaining.max(0.0);

    let (possessions, possessions_estimated) =
        match extracted_possessions(payload, sport, cfg).filter(|p| *p > 0.0 && p.is_finite()) {
            Some(p) => (p, false),
            None => {
                let estimate = estimate_possessions(elapsed, cfg);
                tracing::debug!(
                    match_id = %payload.id,
                    sport = sport.key(),
                    elapsed,
                    estimate,
                    "no possession count in payload, using pace estimate"
                );
                (estimate, true)
            }
        };

    GameState {
        sport,
        home_score,
        away_score,
        total_score: home_score + away_score,
        period: payload.period.unwrap_or(0.0).clamp(0.0, u8::MAX as f64) as u8,
        elapsed_minutes: elapsed,
        remaining_minutes: remaining,
        possessions: possessions.max(MIN_POSSESSIONS),
        possessions_estimated,
        is_live: phase == MatchPhase::Live,
        is_final: phase == MatchPhase::Final,
    }
}

/// Highest score seen per match across poll cycles. Feeds occasionally
/// serve a stale scoreboard; scores never go down within one game.
#[derive(Debug, Default)]
pub struct ScoreMemory {
    seen: HashMap<String, (f64, f64)>,
}

impl ScoreMemory {
    pub fn new() -> Self {
        Self::default()
    }

    fn merge(&mut self, id: &str, home: &mut Option<f64>, away: &mut Option<f64>) {
        if id.is_empty() {
            return;
        }
        let entry = self.seen.entry(id.to_string()).or_insert((0.0, 0.0));
        if let Some(h) = home.as_mut() {
            entry.0 = entry.0.max(*h);
            *h = entry.0;
        }
        if let Some(a) = away.as_mut() {
            entry.1 = entry.1.max(*a);
            *a = entry.1;
        }
    }

    /// Raise every score in the slate to the maximum seen for its match.
    pub fn apply(&mut self, slate: &mut Slate) {
        for record in &mut slate.matches {
            self.merge(&record.id, &mut record.home_score, &mut record.away_score);
        }
        for payload in &mut slate.live {
            self.merge(&payload.id, &mut payload.home_score, &mut payload.away_score);
        }
    }

    /// Drop matches no longer on the slate.
    pub fn retain_slate(&mut self, slate: &Slate) {
        self.seen.retain(|id, _| slate.matches.iter().any(|m| &m.id == id));
    }
}
