use crate::feed::types::{PregameExpectation, Sport};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Sport keys carried in the built-in tables.
pub const SPORT_KEYS: &[&str] = &["nba", "wnba", "ncaab", "nfl", "ncaaf", "nhl", "mlb", "soccer"];

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub edge: EdgeConfig,
    /// Per-sport clock and possession tables, keyed by `Sport::key()`.
    #[serde(default)]
    pub sports: HashMap<String, SportConfig>,
    /// Fallback baselines when a match has no pregame expectation.
    #[serde(default)]
    pub pregame_defaults: HashMap<String, PregameExpectation>,
    pub feed: Option<FeedConfig>,
}

/// Price-break gates and scoring constants.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EdgeConfig {
    /// |R_real - R_market| needed to execute (points per minute).
    #[serde(default = "default_min_market_delta")]
    pub min_market_delta: f64,
    #[serde(default = "default_min_edge_percent")]
    pub min_edge_percent: f64,
    #[serde(default = "default_min_minutes_remaining")]
    pub min_minutes_remaining: f64,
    #[serde(default = "default_magnitude_normalizer")]
    pub magnitude_normalizer: f64,
    /// One driver must outweigh the other by this factor to be primary.
    #[serde(default = "default_driver_ratio")]
    pub driver_ratio: f64,
    /// Share of `min_market_delta` at which a break is reported as detected.
    #[serde(default = "default_detection_fraction")]
    pub detection_fraction: f64,
}

fn default_min_market_delta() -> f64 { 0.3 }
fn default_min_edge_percent() -> f64 { 0.03 }
fn default_min_minutes_remaining() -> f64 { 2.0 }
fn default_magnitude_normalizer() -> f64 { 0.15 }
fn default_driver_ratio() -> f64 { 1.5 }
fn default_detection_fraction() -> f64 { 0.5 }

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            min_market_delta: default_min_market_delta(),
            min_edge_percent: default_min_edge_percent(),
            min_minutes_remaining: default_min_minutes_remaining(),
            magnitude_normalizer: default_magnitude_normalizer(),
            driver_ratio: default_driver_ratio(),
            detection_fraction: default_detection_fraction(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SportConfig {
    pub periods: u8,
    pub minutes_per_period: f64,
    #[serde(default)]
    pub overtime_minutes: f64,
    /// Clock is a running match minute (soccer) instead of a countdown.
    #[serde(default)]
    pub minute_clock: bool,
    /// Possessions per minute per team, used by the estimator.
    pub base_pace: f64,
    pub min_possessions_for_stability: f64,
    /// Plays per possession when a play count is available.
    #[serde(default)]
    pub play_divisor: Option<f64>,
    #[serde(default)]
    pub late_game_after_minutes: Option<f64>,
    #[serde(default)]
    pub late_game_multiplier: Option<f64>,
    /// |margin| in the final regulation period that makes a blowout.
    #[serde(default)]
    pub blowout_margin: Option<f64>,
    /// |margin| in the final regulation period at or under which the game
    /// counts as close.
    #[serde(default)]
    pub close_margin: Option<f64>,
}

impl SportConfig {
    pub fn regulation_minutes(&self) -> f64 {
        self.periods as f64 * self.minutes_per_period
    }

    /// Built-in table for a sport. Unknown sports use the NBA table.
    pub fn builtin(sport: Sport) -> Self {
        let base = |periods, minutes_per_period, overtime_minutes, base_pace, stability| SportConfig {
            periods,
            minutes_per_period,
            overtime_minutes,
            minute_clock: false,
            base_pace,
            min_possessions_for_stability: stability,
            play_divisor: None,
            late_game_after_minutes: None,
            late_game_multiplier: None,
            blowout_margin: None,
            close_margin: None,
        };
        match sport {
            Sport::Nba | Sport::Other => SportConfig {
                play_divisor: Some(2.2),
                late_game_after_minutes: Some(36.0),
                late_game_multiplier: Some(1.05),
                blowout_margin: Some(15.0),
                close_margin: Some(10.0),
                ..base(4, 12.0, 5.0, 1.04, 20.0)
            },
            Sport::Wnba => SportConfig {
                play_divisor: Some(2.2),
                ..base(4, 10.0, 5.0, 1.0, 16.0)
            },
            Sport::Ncaab => SportConfig {
                play_divisor: Some(2.5),
                ..base(2, 20.0, 5.0, 0.85, 16.0)
            },
            Sport::Nfl => base(4, 15.0, 10.0, 0.183, 6.0),
            Sport::Ncaaf => base(4, 15.0, 15.0, 0.2, 6.0),
            Sport::Nhl => base(3, 20.0, 5.0, 0.5, 15.0),
            Sport::Mlb => base(9, 20.0, 20.0, 0.21, 20.0),
            Sport::Soccer => SportConfig {
                minute_clock: true,
                ..base(2, 45.0, 0.0, 0.14, 8.0)
            },
        }
    }
}

/// Built-in pregame baseline: combined possessions per minute, points per
/// possession, and the full-game total they imply.
pub fn builtin_pregame(sport: Sport) -> PregameExpectation {
    let (pace, efficiency, total) = match sport {
        Sport::Nba | Sport::Other => (2.08, 2.28, 228.0),
        Sport::Wnba => (2.0, 2.05, 164.0),
        Sport::Ncaab => (1.7, 2.09, 142.0),
        Sport::Nfl => (0.366, 2.05, 45.0),
        Sport::Ncaaf => (0.4, 2.29, 55.0),
        Sport::Nhl => (1.0, 0.1, 6.0),
        Sport::Mlb => (0.42, 0.112, 8.5),
        Sport::Soccer => (0.28, 0.099, 2.5),
    };
    PregameExpectation {
        expected_pace: pace,
        expected_efficiency: efficiency,
        expected_total: total,
        ..Default::default()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    pub url: String,
    #[serde(default = "default_live_poll")]
    pub live_poll_interval_s: u64,
    #[serde(default = "default_pre_game_poll")]
    pub pre_game_poll_interval_s: u64,
    #[serde(default = "default_timeout")]
    pub request_timeout_ms: u64,
}

fn default_live_poll() -> u64 { 3 }
fn default_pre_game_poll() -> u64 { 30 }
fn default_timeout() -> u64 { 5000 }

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            edge: EdgeConfig::default(),
            sports: HashMap::new(),
            pregame_defaults: HashMap::new(),
            feed: None,
        };
        config.fill_builtin_tables();
        config
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)
            .with_context(|| "Failed to parse config TOML")?;
        config.fill_builtin_tables();
        config.validate()?;
        Ok(config)
    }

    /// Sports the file leaves out keep their built-in tables.
    fn fill_builtin_tables(&mut self) {
        for key in SPORT_KEYS {
            let sport = Sport::from_key(key);
            self.sports
                .entry(key.to_string())
                .or_insert_with(|| SportConfig::builtin(sport));
            self.pregame_defaults
                .entry(key.to_string())
                .or_insert_with(|| builtin_pregame(sport));
        }
    }

    fn validate(&self) -> Result<()> {
        for (key, sport) in &self.sports {
            if sport.periods == 0 || sport.minutes_per_period <= 0.0 {
                anyhow::bail!("sports.{}: periods and minutes_per_period must be positive", key);
            }
            if sport.base_pace <= 0.0 {
                anyhow::bail!("sports.{}: base_pace must be positive", key);
            }
            if sport.play_divisor.is_some_and(|d| d <= 0.0) {
                anyhow::bail!("sports.{}: play_divisor must be positive", key);
            }
            if let (Some(blowout), Some(close)) = (sport.blowout_margin, sport.close_margin) {
                if close >= blowout {
                    anyhow::bail!("sports.{}: close_margin must be below blowout_margin", key);
                }
            }
        }
        if self.edge.magnitude_normalizer <= 0.0 {
            anyhow::bail!("edge.magnitude_normalizer must be positive");
        }
        Ok(())
    }

    pub fn sport(&self, sport: Sport) -> SportConfig {
        self.sports
            .get(sport.key())
            .or_else(|| self.sports.get(Sport::Nba.key()))
            .cloned()
            .unwrap_or_else(|| SportConfig::builtin(sport))
    }

    pub fn pregame_default(&self, sport: Sport) -> PregameExpectation {
        self.pregame_defaults
            .get(sport.key())
            .or_else(|| self.pregame_defaults.get(Sport::Nba.key()))
            .cloned()
            .unwrap_or_else(|| builtin_pregame(sport))
    }
}
