//! Kind-aware parsing of raw odds values.
//!
//! Providers hand us numbers, American-odds strings ("+150"), pick'em
//! markers ("PK"), totals with side prefixes ("O 42.5"), juice in parens
//! ("-3.5 (-110)") and provider-prefixed blobs ("DraftKings -3.5"). Every
//! shape collapses to `Option<f64>`; nothing here fails loudly.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

/// What a raw value is supposed to represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OddsKind {
    /// Point spread / handicap.
    Spread,
    /// American-odds price (moneyline or juice).
    Price,
    /// Game total line.
    Total,
}

/// Spreads practically never exceed ~60 points. Anything at or above this is
/// a moneyline that landed in a spread field.
pub const MAX_SPREAD_MAGNITUDE: f64 = 100.0;

static RE_SIGNED_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+(\.\d+)?|\.\d+)$").unwrap());
static RE_SIDE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(OVER|UNDER|O|U)\s*").unwrap());
static RE_PAREN_JUICE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());
static RE_FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[+-]?(\d+(\.\d+)?|\.\d+)").unwrap());

/// Parse a raw JSON value as odds of the given kind.
pub fn parse_odds_value(value: &Value, kind: OddsKind) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().and_then(|v| guard(v, kind)),
        Value::String(s) => parse_odds_str(s, kind),
        _ => None,
    }
}

/// Parse a raw odds string as odds of the given kind.
pub fn parse_odds_str(raw: &str, kind: OddsKind) -> Option<f64> {
    let upper = raw.trim().to_uppercase().replace('½', ".5");
    if upper.is_empty() {
        return None;
    }

    if let Some(marked) = marker_value(&upper, kind) {
        return marked;
    }

    let tokens: Vec<&str> = upper.split_whitespace().collect();
    // "PK -110": the number is juice, the line is the marker.
    if kind == OddsKind::Spread && tokens.len() > 1 {
        if let Some(Some(line)) = marker_value(tokens[0], kind) {
            return Some(line);
        }
    }
    let candidate = if tokens.len() > 1 {
        let cleaned: Vec<&str> = tokens.iter().map(|t| clean_token(t)).collect();
        let signed = |t: &&&str| RE_SIGNED_TOKEN.is_match(t);
        cleaned
            .iter()
            .filter(signed)
            .find(|t| t.parse::<f64>().is_ok_and(|v| fits_kind(v, kind)))
            .or_else(|| cleaned.iter().find(signed))
            .map(|t| t.to_string())
            .unwrap_or_else(|| upper.clone())
    } else {
        upper.clone()
    };

    let stripped = RE_SIDE_PREFIX.replace(&candidate, "");
    let stripped = RE_PAREN_JUICE.replace_all(&stripped, "");
    if let Some(marked) = marker_value(stripped.trim(), kind) {
        return marked;
    }
    let number = RE_FIRST_NUMBER.find(&stripped)?;
    let value: f64 = number.as_str().parse().ok()?;
    guard(value, kind)
}

/// Fixed vocabulary of non-numeric markers. `Some(None)` means "known to be
/// empty", `None` means "not a marker".
fn marker_value(s: &str, kind: OddsKind) -> Option<Option<f64>> {
    match s {
        "-" | "--" | "N/A" | "NA" | "NL" | "OFF" => Some(None),
        "PK" | "PICK" | "PICK'EM" | "PICKEM" => Some(match kind {
            OddsKind::Price => None,
            _ => Some(0.0),
        }),
        "EV" | "EVEN" => Some(match kind {
            OddsKind::Price => Some(100.0),
            _ => Some(0.0),
        }),
        _ => None,
    }
}

/// Drop a side prefix or team label glued to the number ("O42.5", "BOS-6").
fn clean_token(token: &str) -> &str {
    let rest = RE_SIDE_PREFIX
        .find(token)
        .map_or(token, |m| &token[m.end()..]);
    rest.trim_start_matches(|c: char| c.is_ascii_alphabetic())
}

/// Whether a number looks like the kind it was asked for. In "O42.5 -110"
/// the line and the juice differ only in magnitude.
fn fits_kind(value: f64, kind: OddsKind) -> bool {
    match kind {
        OddsKind::Spread => value.abs() < MAX_SPREAD_MAGNITUDE,
        OddsKind::Price => value.abs() >= 100.0,
        OddsKind::Total => value >= 0.0,
    }
}

fn guard(value: f64, kind: OddsKind) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    if kind == OddsKind::Spread && value.abs() >= MAX_SPREAD_MAGNITUDE {
        return None;
    }
    Some(value)
}
