use serde::{Deserialize, Serialize};

/// Lifecycle phase of a match, as far as market selection is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchPhase {
    Scheduled,
    Live,
    Final,
}

/// Statuses that look terminal or live by substring but mean the game has
/// not been played ("POSTPONED" contains "POST").
const NOT_STARTED: &[&str] = &["POSTPONED", "CANCELED", "CANCELLED", "SUSPENDED", "SCHEDULED"];

const FINAL_KEYWORDS: &[&str] = &[
    "FINISHED", "FINAL", "POST", "FULL_TIME", "FULLTIME", "FULL TIME", "ENDED", "COMPLETE", "FT",
    "AET", "PK", "PEN",
];

const LIVE_KEYWORDS: &[&str] = &[
    "LIVE", "IN_PROGRESS", "IN PROGRESS", "INPROGRESS", "IN_PLAY", "INPLAY", "HALFTIME",
    "HALF_TIME", "FIRST_HALF", "SECOND_HALF", "END_PERIOD", "END_OF_PERIOD", "OVERTIME",
    "SHOOTOUT", "EXTRA_TIME", "HT", "OT", "1H", "2H",
];

/// Stoppages that can also hit a game already in play.
const INTERRUPTED: &[&str] = &["SUSPENDED", "DELAYED", "POSTPONED", "INTERRUPTED"];

/// Keywords this short only match a whole token, so "LEFT" never reads as "FT".
const SHORT_KEYWORD_LEN: usize = 3;

/// Classify a provider status string. Matching is case-insensitive; a final
/// keyword beats a live one ("STATUS_FINAL_OT" is final).
pub fn classify_status(status: &str) -> MatchPhase {
    let upper = status.trim().to_uppercase();
    if upper.is_empty() {
        return MatchPhase::Scheduled;
    }
    let tokens: Vec<&str> = upper
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    let matches = |keyword: &str| {
        if keyword.len() <= SHORT_KEYWORD_LEN {
            tokens.iter().any(|t| *t == keyword)
        } else {
            upper.contains(keyword)
        }
    };

    if NOT_STARTED.iter().any(|k| upper.contains(k)) {
        MatchPhase::Scheduled
    } else if FINAL_KEYWORDS.iter().any(|k| matches(k)) {
        MatchPhase::Final
    } else if LIVE_KEYWORDS.iter().any(|k| matches(k)) {
        MatchPhase::Live
    } else {
        MatchPhase::Scheduled
    }
}

/// Like [`classify_status`], but a stoppage after play has begun stays
/// live: a suspended game must not fall back to pregame markets.
pub fn classify_status_in_play(status: &str, started: bool) -> MatchPhase {
    match classify_status(status) {
        MatchPhase::Scheduled if started && is_interrupted(status) => MatchPhase::Live,
        phase => phase,
    }
}

fn is_interrupted(status: &str) -> bool {
    let upper = status.to_uppercase();
    INTERRUPTED.iter().any(|k| upper.contains(k))
}
