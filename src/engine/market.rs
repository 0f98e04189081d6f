use super::moneyline::{analyze_moneyline, MoneylineAnalysis};
use super::resolver::resolve_market_fields;
use super::source_stack::build_source_stack;
use super::spread::{analyze_spread, SpreadAnalysis};
use super::status::MatchPhase;
use super::total::{analyze_total, TotalAnalysis};
use crate::feed::types::MatchRecord;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketState {
    Open,
    Live,
    Settled,
}

impl From<MatchPhase> for MarketState {
    fn from(phase: MatchPhase) -> Self {
        match phase {
            MatchPhase::Scheduled => MarketState::Open,
            MatchPhase::Live => MarketState::Live,
            MatchPhase::Final => MarketState::Settled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BetResult {
    Won,
    Lost,
    Push,
}

impl BetResult {
    /// The same outcome seen from the other side of the bet.
    pub fn flip(self) -> Self {
        match self {
            BetResult::Won => BetResult::Lost,
            BetResult::Lost => BetResult::Won,
            BetResult::Push => BetResult::Push,
        }
    }
}

/// Canonical read of every market for one match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketRead {
    pub phase: MatchPhase,
    pub spread: SpreadAnalysis,
    pub total: TotalAnalysis,
    pub moneyline: MoneylineAnalysis,
}

/// Stack → resolve → analyze. Pure: the same record always reads the same.
pub fn read_market(record: &MatchRecord) -> MarketRead {
    let stack = build_source_stack(record);
    let fields = resolve_market_fields(&stack);
    MarketRead {
        phase: stack.phase,
        spread: analyze_spread(record, &fields),
        total: analyze_total(record, &fields),
        moneyline: analyze_moneyline(record, &fields),
    }
}

/// Spread display: "-" when absent, "PK" at zero, otherwise signed.
pub fn format_line(line: Option<f64>) -> String {
    match line {
        None => "-".to_string(),
        Some(v) if v.abs() < 1e-9 => "PK".to_string(),
        Some(v) => signed(v),
    }
}

/// American-odds display: "-" when absent, otherwise signed.
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(v) if v.abs() >= 1e-9 => signed(v),
        _ => "-".to_string(),
    }
}

/// Total display: unsigned, "-" when absent.
pub fn format_total(total: Option<f64>) -> String {
    match total {
        Some(v) => trim(v),
        None => "-".to_string(),
    }
}

fn signed(v: f64) -> String {
    if v > 0.0 {
        format!("+{}", trim(v))
    } else {
        trim(v)
    }
}

fn trim(v: f64) -> String {
    // Two decimals is finer than any book quotes; drops float noise.
    let rounded = (v * 100.0).round() / 100.0;
    format!("{}", rounded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line() {
        assert_eq!(format_line(None), "-");
        assert_eq!(format_line(Some(0.0)), "PK");
        assert_eq!(format_line(Some(-0.0)), "PK");
        assert_eq!(format_line(Some(4.5)), "+4.5");
        assert_eq!(format_line(Some(-7.0)), "-7");
        assert_eq!(format_line(Some(-2.5000000001)), "-2.5");
    }

    #[test]
    fn test_format_price_and_total() {
        assert_eq!(format_price(Some(150.0)), "+150");
        assert_eq!(format_price(Some(-110.0)), "-110");
        assert_eq!(format_price(Some(0.0)), "-");
        assert_eq!(format_price(None), "-");
        assert_eq!(format_total(Some(221.5)), "221.5");
        assert_eq!(format_total(None), "-");
    }

    #[test]
    fn test_state_mirrors_phase() {
        assert_eq!(MarketState::from(MatchPhase::Scheduled), MarketState::Open);
        assert_eq!(MarketState::from(MatchPhase::Live), MarketState::Live);
        assert_eq!(MarketState::from(MatchPhase::Final), MarketState::Settled);
    }

    #[test]
    fn test_bet_result_flip() {
        assert_eq!(BetResult::Won.flip(), BetResult::Lost);
        assert_eq!(BetResult::Push.flip(), BetResult::Push);
    }
}
