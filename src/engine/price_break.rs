//! Price-break detection: is the live total mispriced against realized
//! scoring, and is the divergence stable, large and early enough to act on?

use super::game_script::GameScript;
use super::metrics::LiveMetrics;
use crate::config::{EdgeConfig, SportConfig};
use crate::feed::live_state::GameState;
use crate::feed::pregame::BaselineSource;
use serde::Serialize;

/// Relative deviation from the pregame baseline that counts as a trend.
const TREND_THRESHOLD: f64 = 0.05;
/// Last share of regulation flagged as late game.
const LATE_GAME_FRACTION: f64 = 0.15;
const NEGLIGIBLE_IMPACT: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Over,
    Under,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Over => "OVER",
            Direction::Under => "UNDER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Driver {
    Pace,
    Efficiency,
    Both,
}

impl Driver {
    pub fn as_str(self) -> &'static str {
        match self {
            Driver::Pace => "PACE",
            Driver::Efficiency => "EFFICIENCY",
            Driver::Both => "BOTH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CausalFlag {
    FastPace,
    SlowPace,
    HotEfficiency,
    ColdEfficiency,
    /// Too few possessions for the rates to mean much.
    SmallSample,
    LateGame,
    /// Baseline is the sport default, not a matchup projection.
    DefaultBaseline,
    /// Market rate sits closer to the pregame rate than to what is happening.
    MarketLag,
    /// Final-period margin at or past the blowout threshold.
    Blowout,
    CloseGame,
}

/// Executability gates, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    NoMarket,
    Unstable,
    MarketDelta,
    EdgePercent,
    TimeRemaining,
    NoDirection,
}

impl Gate {
    pub fn describe(self) -> &'static str {
        match self {
            Gate::NoMarket => "no live total",
            Gate::Unstable => "sample not stable",
            Gate::MarketDelta => "rate gap below threshold",
            Gate::EdgePercent => "edge below threshold",
            Gate::TimeRemaining => "too little time remaining",
            Gate::NoDirection => "rate and edge disagree",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBreak {
    pub detected: bool,
    pub is_executable: bool,
    pub direction: Option<Direction>,
    pub primary_driver: Option<Driver>,
    /// Current total plus realized rate over the remaining minutes.
    pub fair_value: f64,
    pub edge: Option<f64>,
    pub edge_percent: Option<f64>,
    pub magnitude: f64,
    pub confidence: f64,
    pub causal_flags: Vec<CausalFlag>,
    pub failed_gates: Vec<Gate>,
}

/// OVER only when both the rate gap and the edge point up; UNDER only when
/// both point down.
pub fn classify_direction(r_real: f64, r_market: f64, edge: f64) -> Option<Direction> {
    if r_real > r_market && edge > 0.0 {
        Some(Direction::Over)
    } else if r_real < r_market && edge < 0.0 {
        Some(Direction::Under)
    } else {
        None
    }
}

/// Attribute the rate gap to pace or efficiency by each one's contribution
/// to points per minute.
pub fn primary_driver(metrics: &LiveMetrics, ratio: f64) -> Option<Driver> {
    let pace_impact = (metrics.pace_delta * metrics.e_expected).abs();
    let efficiency_impact = (metrics.efficiency_delta * metrics.p_expected).abs();
    if pace_impact < NEGLIGIBLE_IMPACT && efficiency_impact < NEGLIGIBLE_IMPACT {
        None
    } else if pace_impact >= ratio * efficiency_impact {
        Some(Driver::Pace)
    } else if efficiency_impact >= ratio * pace_impact {
        Some(Driver::Efficiency)
    } else {
        Some(Driver::Both)
    }
}

fn relative(delta: f64, expected: f64) -> f64 {
    if expected.abs() < NEGLIGIBLE_IMPACT {
        0.0
    } else {
        delta / expected
    }
}

fn causal_flags(
    state: &GameState,
    metrics: &LiveMetrics,
    baseline: BaselineSource,
    sport: &SportConfig,
) -> Vec<CausalFlag> {
    let mut flags = Vec::new();
    let pace = relative(metrics.pace_delta, metrics.p_expected);
    if pace > TREND_THRESHOLD {
        flags.push(CausalFlag::FastPace);
    } else if pace < -TREND_THRESHOLD {
        flags.push(CausalFlag::SlowPace);
    }
    let efficiency = relative(metrics.efficiency_delta, metrics.e_expected);
    if efficiency > TREND_THRESHOLD {
        flags.push(CausalFlag::HotEfficiency);
    } else if efficiency < -TREND_THRESHOLD {
        flags.push(CausalFlag::ColdEfficiency);
    }
    if !metrics.is_stable {
        flags.push(CausalFlag::SmallSample);
    }
    if state.remaining_minutes <= sport.regulation_minutes() * LATE_GAME_FRACTION {
        flags.push(CausalFlag::LateGame);
    }
    if baseline == BaselineSource::SportDefault {
        flags.push(CausalFlag::DefaultBaseline);
    }
    match metrics.game_script {
        Some(GameScript::Blowout { .. }) => flags.push(CausalFlag::Blowout),
        Some(GameScript::Close) => flags.push(CausalFlag::CloseGame),
        _ => {}
    }
    if let Some(r_market) = metrics.r_market {
        if (r_market - metrics.r_expected).abs() < (metrics.r_real - r_market).abs() {
            flags.push(CausalFlag::MarketLag);
        }
    }
    flags
}

pub fn detect_price_break(
    state: &GameState,
    metrics: &LiveMetrics,
    live_total: Option<f64>,
    baseline: BaselineSource,
    edge_cfg: &EdgeConfig,
    sport: &SportConfig,
) -> PriceBreak {
    let fair_value = state.total_score + metrics.r_real * state.remaining_minutes;
    let live_total = live_total.filter(|t| *t > 0.0 && t.is_finite());

    let edge = live_total.map(|t| fair_value - t);
    let edge_percent = match (edge, live_total) {
        (Some(e), Some(t)) => Some(e.abs() / t),
        _ => None,
    };

    let market_delta = metrics.market_delta.unwrap_or(0.0);
    let magnitude = market_delta.abs() / edge_cfg.magnitude_normalizer;
    let confidence = metrics.stability_score * (magnitude / 2.0).min(1.0);

    let direction = match (metrics.r_market, edge) {
        (Some(r_market), Some(e)) => classify_direction(metrics.r_real, r_market, e),
        _ => None,
    };

    let mut failed_gates = Vec::new();
    if metrics.market_delta.is_none() || live_total.is_none() {
        failed_gates.push(Gate::NoMarket);
    }
    if !metrics.is_stable {
        failed_gates.push(Gate::Unstable);
    }
    if market_delta.abs() <= edge_cfg.min_market_delta {
        failed_gates.push(Gate::MarketDelta);
    }
    if edge_percent.unwrap_or(0.0) <= edge_cfg.min_edge_percent {
        failed_gates.push(Gate::EdgePercent);
    }
    if state.remaining_minutes <= edge_cfg.min_minutes_remaining {
        failed_gates.push(Gate::TimeRemaining);
    }
    if direction.is_none() {
        failed_gates.push(Gate::NoDirection);
    }

    let detected = metrics.market_delta.is_some()
        && market_delta.abs() > edge_cfg.min_market_delta * edge_cfg.detection_fraction;

    PriceBreak {
        detected,
        is_executable: failed_gates.is_empty(),
        direction,
        primary_driver: primary_driver(metrics, edge_cfg.driver_ratio),
        fair_value,
        edge,
        edge_percent,
        magnitude,
        confidence,
        causal_flags: causal_flags(state, metrics, baseline, sport),
        failed_gates,
    }
}

impl PriceBreak {
    /// One-line recommendation for the caller.
    pub fn recommendation(&self, live_total: Option<f64>) -> String {
        let side = self.direction.map(Direction::as_str).unwrap_or("-");
        if self.is_executable {
            let line = live_total.map(|t| format!(" {}", t)).unwrap_or_default();
            let driver = self.primary_driver.map(Driver::as_str).unwrap_or("-");
            return format!(
                "EXECUTE {}{}: fair {:.1}, edge {:+.1} ({:.1}%), driver {}, confidence {:.2}",
                side,
                line,
                self.fair_value,
                self.edge.unwrap_or(0.0),
                self.edge_percent.unwrap_or(0.0) * 100.0,
                driver,
                self.confidence,
            );
        }
        if self.failed_gates.contains(&Gate::NoMarket) {
            return "NO MARKET: live total unavailable".to_string();
        }
        if self.detected {
            let reasons: Vec<&str> = self.failed_gates.iter().map(|g| g.describe()).collect();
            return format!("WATCH {}: break detected, not executable ({})", side, reasons.join("; "));
        }
        "NO EDGE: market in line with live scoring".to_string()
    }
}
