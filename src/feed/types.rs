use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Raw input records handed to the core by the ingest layer.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", rename_all = "lowercase")]
pub enum Sport {
    Nba,
    Wnba,
    Ncaab,
    Nfl,
    Ncaaf,
    Nhl,
    Mlb,
    Soccer,
    #[default]
    Other,
}

const SOCCER_LEAGUES: &[&str] = &[
    "epl", "mls", "laliga", "seriea", "bundesliga", "ligue1", "ucl", "uel", "fifa",
];

impl Sport {
    /// Map a provider sport key ("basketball_nba", "NBA", "ice-hockey", ...)
    /// to a sport. Unknown keys map to `Other`.
    pub fn from_key(key: &str) -> Self {
        let key = key.trim().to_lowercase();
        match key.as_str() {
            "wnba" | "basketball_wnba" => Sport::Wnba,
            "nba" | "basketball" | "basketball_nba" => Sport::Nba,
            "ncaab" | "cbb" | "college-basketball" | "basketball_ncaab"
            | "mens-college-basketball" => Sport::Ncaab,
            "nfl" | "football" | "american-football" | "americanfootball_nfl" => Sport::Nfl,
            "ncaaf" | "cfb" | "college-football" | "americanfootball_ncaaf" => Sport::Ncaaf,
            "nhl" | "hockey" | "ice-hockey" | "icehockey_nhl" => Sport::Nhl,
            "mlb" | "baseball" | "baseball_mlb" => Sport::Mlb,
            k if k.starts_with("soccer") || SOCCER_LEAGUES.contains(&k) => Sport::Soccer,
            _ => Sport::Other,
        }
    }

    /// Config table key.
    pub fn key(self) -> &'static str {
        match self {
            Sport::Nba => "nba",
            Sport::Wnba => "wnba",
            Sport::Ncaab => "ncaab",
            Sport::Nfl => "nfl",
            Sport::Ncaaf => "ncaaf",
            Sport::Nhl => "nhl",
            Sport::Mlb => "mlb",
            Sport::Soccer => "soccer",
            Sport::Other => "other",
        }
    }

    pub fn is_basketball(self) -> bool {
        matches!(self, Sport::Nba | Sport::Wnba | Sport::Ncaab)
    }

    pub fn is_football(self) -> bool {
        matches!(self, Sport::Nfl | Sport::Ncaaf)
    }

    /// Hockey and baseball trade a conventional 1.5 puck/run line.
    pub fn has_run_line(self) -> bool {
        matches!(self, Sport::Nhl | Sport::Mlb)
    }
}

impl From<String> for Sport {
    fn from(key: String) -> Self {
        Sport::from_key(&key)
    }
}

/// One named bag of raw market fields. Keys arrive in whatever shape the
/// provider used (camelCase, snake_case, nested objects), so the snapshot is
/// kept as raw JSON and looked up through the resolver's alias table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OddsSnapshot(Map<String, Value>);

const LIVE_FLAG_KEYS: &[&str] = &["isLive", "is_live", "live", "inPlay", "in_play"];
const PROVIDER_KEYS: &[&str] = &["provider", "bookmaker", "book", "source", "provider.name"];

impl OddsSnapshot {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build a snapshot from a JSON object. Anything else is not a snapshot.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up a key or a dotted path (`spread.home`). A literal key that
    /// contains a dot wins over the nested walk.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        if let Some(v) = self.0.get(path) {
            return Some(v);
        }
        if !path.contains('.') {
            return None;
        }
        let mut parts = path.split('.');
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Whether the snapshot marks itself as in-play.
    pub fn live_flag(&self) -> bool {
        LIVE_FLAG_KEYS.iter().any(|key| match self.lookup(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            Some(Value::Number(n)) => n.as_i64() == Some(1),
            _ => false,
        })
    }

    pub fn provider(&self) -> Option<String> {
        PROVIDER_KEYS.iter().find_map(|key| match self.lookup(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
    }
}

/// A match as supplied by the ingest layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(default, alias = "matchId", alias = "match_id")]
    pub id: String,
    #[serde(default)]
    pub sport: Sport,
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "homeTeam")]
    pub home_team: String,
    #[serde(default, alias = "awayTeam")]
    pub away_team: String,
    #[serde(default, alias = "homeScore", deserialize_with = "lenient::f64_opt")]
    pub home_score: Option<f64>,
    #[serde(default, alias = "awayScore", deserialize_with = "lenient::f64_opt")]
    pub away_score: Option<f64>,
    #[serde(
        default,
        alias = "currentOdds",
        alias = "live_odds",
        deserialize_with = "lenient::snapshot_opt"
    )]
    pub current_odds: Option<OddsSnapshot>,
    #[serde(default, alias = "consensus", deserialize_with = "lenient::snapshot_opt")]
    pub odds: Option<OddsSnapshot>,
    #[serde(default, alias = "openingOdds", deserialize_with = "lenient::snapshot_opt")]
    pub opening_odds: Option<OddsSnapshot>,
    #[serde(default, alias = "closingOdds", deserialize_with = "lenient::snapshot_opt")]
    pub closing_odds: Option<OddsSnapshot>,
}

impl MatchRecord {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse match record")
    }

    pub fn home_score(&self) -> f64 {
        self.home_score.unwrap_or(0.0)
    }

    pub fn away_score(&self) -> f64 {
        self.away_score.unwrap_or(0.0)
    }

    pub fn has_scores(&self) -> bool {
        self.home_score.is_some() && self.away_score.is_some()
    }
}

/// In-play facts for one match, as pushed or polled from a live score feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LivePayload {
    #[serde(default, alias = "matchId", alias = "match_id")]
    pub id: String,
    #[serde(default)]
    pub sport: Option<Sport>,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub period: Option<f64>,
    #[serde(default, alias = "displayClock", alias = "clock")]
    pub display_clock: Option<String>,
    #[serde(default, deserialize_with = "lenient::minute_opt")]
    pub minute: Option<f64>,
    #[serde(default, alias = "homeScore", deserialize_with = "lenient::f64_opt")]
    pub home_score: Option<f64>,
    #[serde(default, alias = "awayScore", deserialize_with = "lenient::f64_opt")]
    pub away_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub drives: Option<f64>,
    #[serde(default, alias = "homeDrives", deserialize_with = "lenient::f64_opt")]
    pub home_drives: Option<f64>,
    #[serde(default, alias = "awayDrives", deserialize_with = "lenient::f64_opt")]
    pub away_drives: Option<f64>,
    #[serde(default, alias = "playCount", deserialize_with = "lenient::f64_opt")]
    pub play_count: Option<f64>,
}

/// Ratio of a team's rate in a fourth-quarter blowout to its close-game
/// rate: 0.95 pace means five percent fewer possessions per minute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptDelta {
    #[serde(alias = "paceDelta")]
    pub pace_delta: f64,
    #[serde(alias = "pppDelta")]
    pub ppp_delta: f64,
}

/// One team's blowout priors, split by whether it is ahead or behind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlowoutPrior {
    #[serde(default)]
    pub leading: Option<ScriptDelta>,
    #[serde(default)]
    pub trailing: Option<ScriptDelta>,
}

/// Pregame baseline for one match, from the external expectations table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PregameExpectation {
    #[serde(default, alias = "matchId", alias = "id")]
    pub match_id: String,
    #[serde(alias = "expectedPace")]
    pub expected_pace: f64,
    #[serde(alias = "expectedEfficiency")]
    pub expected_efficiency: f64,
    #[serde(default, alias = "expectedTotal")]
    pub expected_total: f64,
    #[serde(default, alias = "homeOffRating")]
    pub home_off_rating: f64,
    #[serde(default, alias = "homeDefRating")]
    pub home_def_rating: f64,
    #[serde(default, alias = "awayOffRating")]
    pub away_off_rating: f64,
    #[serde(default, alias = "awayDefRating")]
    pub away_def_rating: f64,
    #[serde(default, alias = "homeBlowout")]
    pub home_blowout: Option<BlowoutPrior>,
    #[serde(default, alias = "awayBlowout")]
    pub away_blowout: Option<BlowoutPrior>,
}

/// A batch of inputs: matches plus the live payloads and baselines that go
/// with them, joined by match id. A malformed row is dropped on its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Slate {
    #[serde(default, deserialize_with = "lenient::rows")]
    pub matches: Vec<MatchRecord>,
    #[serde(default, deserialize_with = "lenient::rows")]
    pub live: Vec<LivePayload>,
    #[serde(default, deserialize_with = "lenient::rows")]
    pub pregame: Vec<PregameExpectation>,
}

impl Slate {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse slate")
    }

    pub fn live_for(&self, match_id: &str) -> Option<&LivePayload> {
        self.live.iter().find(|p| p.id == match_id)
    }
}

/// Scores and counters show up as numbers or as numeric strings.
pub(crate) mod lenient {
    use super::*;
    use serde::de::DeserializeOwned;

    /// Parse each element on its own; rows that do not fit are logged and
    /// skipped. A missing or null list is empty.
    pub fn rows<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let values = Option::<Vec<Value>>::deserialize(d)?.unwrap_or_default();
        Ok(parse_rows(values))
    }

    pub fn parse_rows<T: DeserializeOwned>(values: Vec<Value>) -> Vec<T> {
        values
            .into_iter()
            .enumerate()
            .filter_map(|(row, value)| match serde_json::from_value(value) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    tracing::warn!(row, error = %e, "dropping malformed slate row");
                    None
                }
            })
            .collect()
    }

    /// "N/A", null or a bare number where a snapshot object belongs.
    pub fn snapshot_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<OddsSnapshot>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(value.and_then(OddsSnapshot::from_value))
    }

    fn number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    pub fn f64_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(value.as_ref().and_then(number))
    }

    /// Soccer minute: 67, "67", "67'" or stoppage time "45+2'".
    pub fn minute_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(match value {
            Some(Value::String(s)) => {
                let s = s.trim().trim_end_matches('\'');
                match s.split_once('+') {
                    Some((base, extra)) => {
                        let base = base.trim().parse::<f64>().ok();
                        let extra = extra.trim().parse::<f64>().unwrap_or(0.0);
                        base.map(|b| b + extra)
                    }
                    None => s.parse::<f64>().ok(),
                }
            }
            Some(other) => number(&other),
            None => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sport_from_provider_keys() {
        assert_eq!(Sport::from_key("basketball_nba"), Sport::Nba);
        assert_eq!(Sport::from_key("NBA"), Sport::Nba);
        assert_eq!(Sport::from_key("basketball_wnba"), Sport::Wnba);
        assert_eq!(Sport::from_key("icehockey_nhl"), Sport::Nhl);
        assert_eq!(Sport::from_key("soccer_epl"), Sport::Soccer);
        assert_eq!(Sport::from_key("EPL"), Sport::Soccer);
        assert_eq!(Sport::from_key("cricket"), Sport::Other);
    }

    #[test]
    fn test_snapshot_dotted_lookup() {
        let snap = OddsSnapshot::from_value(json!({
            "spread": { "home": -3.5, "away": 3.5 },
            "total.line": 44.5,
        }))
        .unwrap();
        assert_eq!(snap.lookup("spread.home"), Some(&json!(-3.5)));
        assert_eq!(snap.lookup("total.line"), Some(&json!(44.5)));
        assert_eq!(snap.lookup("spread.middle"), None);
        assert_eq!(snap.lookup("total"), None);
    }

    #[test]
    fn test_snapshot_live_flag_and_provider() {
        let snap = OddsSnapshot::from_value(json!({ "isLive": true, "provider": " ESPN BET " }))
            .unwrap();
        assert!(snap.live_flag());
        assert_eq!(snap.provider().as_deref(), Some("ESPN BET"));

        let snap = OddsSnapshot::from_value(json!({ "is_live": "false" })).unwrap();
        assert!(!snap.live_flag());
        assert_eq!(snap.provider(), None);
    }

    #[test]
    fn test_match_record_aliases_and_string_scores() {
        let record = MatchRecord::from_json(
            r#"{
                "id": "m1",
                "sport": "basketball_nba",
                "status": "STATUS_IN_PROGRESS",
                "homeScore": "55",
                "awayScore": 50,
                "current_odds": { "homeSpread": -2.5 },
                "openingOdds": { "total": 221.5 }
            }"#,
        )
        .unwrap();
        assert_eq!(record.sport, Sport::Nba);
        assert_eq!(record.home_score, Some(55.0));
        assert_eq!(record.away_score, Some(50.0));
        assert!(record.current_odds.is_some());
        assert!(record.opening_odds.is_some());
        assert!(record.closing_odds.is_none());
    }

    #[test]
    fn test_live_payload_soccer_minute_formats() {
        let p: LivePayload = serde_json::from_value(json!({ "id": "a", "minute": "45+2'" })).unwrap();
        assert_eq!(p.minute, Some(47.0));
        let p: LivePayload = serde_json::from_value(json!({ "id": "a", "minute": "67'" })).unwrap();
        assert_eq!(p.minute, Some(67.0));
        let p: LivePayload = serde_json::from_value(json!({ "id": "a", "minute": 12 })).unwrap();
        assert_eq!(p.minute, Some(12.0));
    }

    #[test]
    fn test_non_object_snapshot_reads_as_missing() {
        let record = MatchRecord::from_json(
            r#"{ "id": "m1", "odds": "N/A", "current_odds": null, "opening_odds": 7, "closing_odds": { "total": 41 } }"#,
        )
        .unwrap();
        assert!(record.odds.is_none());
        assert!(record.current_odds.is_none());
        assert!(record.opening_odds.is_none());
        assert!(record.closing_odds.is_some());
    }

    #[test]
    fn test_slate_drops_only_the_bad_rows() {
        let slate = Slate::from_json(
            r#"{
                "matches": [
                    { "id": "m1", "odds": "N/A" },
                    "garbage",
                    { "id": "m2", "odds": { "total": 44.5 } }
                ],
                "live": [{ "id": "m1", "period": 2 }, 17],
                "pregame": [
                    { "matchId": "m1", "expectedTotal": 221.0 },
                    { "matchId": "m2", "expectedPace": 0.37, "expectedEfficiency": 2.0 }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(slate.matches.len(), 2);
        assert!(slate.matches[0].odds.is_none());
        assert_eq!(slate.live.len(), 1);
        assert_eq!(slate.pregame.len(), 1);
        assert_eq!(slate.pregame[0].match_id, "m2");

        let empty = Slate::from_json(r#"{ "matches": null }"#).unwrap();
        assert!(empty.matches.is_empty());
        assert!(Slate::from_json(r#"{ "matches": 3 }"#).is_err());
    }

    #[test]
    fn test_pregame_blowout_priors_camel_case() {
        let e: PregameExpectation = serde_json::from_value(json!({
            "matchId": "m1",
            "expectedPace": 2.0,
            "expectedEfficiency": 1.1,
            "homeBlowout": { "leading": { "paceDelta": 0.96, "pppDelta": 0.98, "nPoss": 41 } },
            "awayBlowout": { "trailing": { "pace_delta": 1.02, "ppp_delta": 1.05 } }
        }))
        .unwrap();
        let home = e.home_blowout.unwrap();
        assert_eq!(home.leading.unwrap().pace_delta, 0.96);
        assert!(home.trailing.is_none());
        assert_eq!(e.away_blowout.unwrap().trailing.unwrap().ppp_delta, 1.05);
    }

    #[test]
    fn test_match_record_rejects_non_object() {
        assert!(MatchRecord::from_json("42").is_err());
        assert!(MatchRecord::from_json("").is_err());
    }
}
