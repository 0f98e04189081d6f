use super::market::{format_line, format_price, BetResult, MarketState, Side};
use super::moneyline::moneyline_favorite;
use super::resolver::ResolvedMarketFields;
use super::source_stack::SourceKind;
use super::status::MatchPhase;
use crate::feed::odds_parser::{parse_odds_value, OddsKind};
use crate::feed::types::{MatchRecord, OddsSnapshot, Sport};
use serde::Serialize;

/// Lines closer to zero than this are not treated as carrying a side.
const SIGN_DEADBAND: f64 = 0.1;
/// Home adjusted score within this of the away score is a push.
const PUSH_EPSILON: f64 = 0.1;
/// Conventional hockey puck line / baseball run line.
const RUN_LINE: f64 = 1.5;

/// Score at the moment the live odds were captured.
const CAPTURED_HOME_SCORE: &[&str] = &[
    "homeScoreAtCapture", "home_score_at_capture", "capturedHomeScore", "score.home",
];
const CAPTURED_AWAY_SCORE: &[&str] = &[
    "awayScoreAtCapture", "away_score_at_capture", "capturedAwayScore", "score.away",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadAnalysis {
    pub home_line: Option<f64>,
    pub away_line: Option<f64>,
    pub home_display: String,
    pub away_display: String,
    pub home_price: Option<f64>,
    pub away_price: Option<f64>,
    pub home_price_display: String,
    pub away_price_display: String,
    pub favored: Option<Side>,
    /// Settlement of the home line; see [`SpreadAnalysis::result_for`].
    pub result: Option<BetResult>,
    pub state: MarketState,
    pub is_live: bool,
    pub provider: Option<String>,
    pub source: Option<SourceKind>,
    /// Sides were swapped to agree with the moneyline favorite.
    pub corrected: bool,
    /// No spread was quoted; the ±1.5 run/puck line was assumed.
    pub defaulted: bool,
    /// A rest-of-game handicap was converted to a full-game line.
    pub live_adjusted: bool,
}

impl SpreadAnalysis {
    pub fn result_for(&self, side: Side) -> Option<BetResult> {
        match side {
            Side::Home => self.result,
            Side::Away => self.result.map(BetResult::flip),
        }
    }
}

/// Favorite only when the moneylines disagree in sign; two negative or two
/// positive prices are too close to overrule the spread.
fn clear_favorite(home_ml: Option<f64>, away_ml: Option<f64>) -> Option<Side> {
    match (home_ml?, away_ml?) {
        (h, a) if h < 0.0 && a > 0.0 => Some(Side::Home),
        (h, a) if a < 0.0 && h > 0.0 => Some(Side::Away),
        _ => None,
    }
}

fn snapshot_score(snapshot: &OddsSnapshot, aliases: &[&str]) -> Option<f64> {
    aliases
        .iter()
        .find_map(|key| snapshot.lookup(key).and_then(|v| parse_odds_value(v, OddsKind::Total)))
}

/// Home-minus-away score the live line was priced against: the score
/// captured with the odds when present, else the record's current score.
fn live_score_diff(record: &MatchRecord) -> f64 {
    let captured = record.current_odds.as_ref().and_then(|snap| {
        let home = snapshot_score(snap, CAPTURED_HOME_SCORE)?;
        let away = snapshot_score(snap, CAPTURED_AWAY_SCORE)?;
        Some(home - away)
    });
    captured.unwrap_or_else(|| record.home_score() - record.away_score())
}

pub fn analyze_spread(record: &MatchRecord, fields: &ResolvedMarketFields) -> SpreadAnalysis {
    let spread = &fields.spread;
    let ml = &fields.moneyline;

    let (mut home, mut away) = match (spread.home, spread.away) {
        (Some(h), None) => (Some(h), Some(-h)),
        (None, Some(a)) => (Some(-a), Some(a)),
        pair => pair,
    };
    let (mut home_price, mut away_price) = (spread.home_price, spread.away_price);

    let mut live_adjusted = false;
    if record.sport == Sport::Soccer && fields.phase == MatchPhase::Live {
        if let Some(h) = home {
            let diff = live_score_diff(record);
            if h.abs() < diff.abs() {
                let full_game = h - diff;
                tracing::debug!(
                    match_id = %record.id,
                    rest_of_game = h,
                    full_game,
                    "soccer live handicap normalized to full game"
                );
                home = Some(full_game);
                away = Some(-full_game);
                live_adjusted = true;
            }
        }
    }

    let mut corrected = false;
    if let (Some(h), Some(a), Some(fav)) = (home, away, clear_favorite(ml.home, ml.away)) {
        let (fav_line, dog_line) = match fav {
            Side::Home => (h, a),
            Side::Away => (a, h),
        };
        if fav_line > SIGN_DEADBAND && dog_line < -SIGN_DEADBAND {
            tracing::debug!(match_id = %record.id, home = h, away = a, "spread signs contradict moneyline, swapping");
            std::mem::swap(&mut home, &mut away);
            std::mem::swap(&mut home_price, &mut away_price);
            corrected = true;
        }
    }

    // Only when the match has some market at all, so an empty live stack
    // stays empty.
    let mut defaulted = false;
    if home.is_none() && away.is_none() && record.sport.has_run_line() && fields.has_any_market() {
        let (h, a) = match moneyline_favorite(ml.home, ml.away).unwrap_or(Side::Home) {
            Side::Home => (-RUN_LINE, RUN_LINE),
            Side::Away => (RUN_LINE, -RUN_LINE),
        };
        home = Some(h);
        away = Some(a);
        defaulted = true;
    }

    let favored = match home {
        Some(h) if h < 0.0 => Some(Side::Home),
        Some(h) if h > 0.0 => Some(Side::Away),
        _ => None,
    };

    let result = match home {
        Some(h) if fields.phase == MatchPhase::Final && record.has_scores() => {
            let adjusted_home = record.home_score() + h;
            let margin = adjusted_home - record.away_score();
            Some(if margin.abs() < PUSH_EPSILON {
                BetResult::Push
            } else if margin > 0.0 {
                BetResult::Won
            } else {
                BetResult::Lost
            })
        }
        _ => None,
    };

    SpreadAnalysis {
        home_line: home,
        away_line: away,
        home_display: format_line(home),
        away_display: format_line(away),
        home_price,
        away_price,
        home_price_display: format_price(home_price),
        away_price_display: format_price(away_price),
        favored,
        result,
        state: fields.phase.into(),
        is_live: fields.phase == MatchPhase::Live,
        provider: spread.origin.as_ref().and_then(|o| o.provider.clone()),
        source: spread.origin.as_ref().map(|o| o.source),
        corrected,
        defaulted,
        live_adjusted,
    }
}
