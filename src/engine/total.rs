use super::market::{format_price, format_total, BetResult, MarketState};
use super::resolver::ResolvedMarketFields;
use super::source_stack::SourceKind;
use super::status::MatchPhase;
use crate::feed::types::MatchRecord;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TotalOutcome {
    Over,
    Under,
    Push,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalAnalysis {
    pub line: Option<f64>,
    pub over_line: Option<f64>,
    pub under_line: Option<f64>,
    pub display: String,
    pub over_price: Option<f64>,
    pub under_price: Option<f64>,
    pub over_price_display: String,
    pub under_price_display: String,
    /// Combined score against the main line, once final.
    pub outcome: Option<TotalOutcome>,
    pub over_result: Option<BetResult>,
    pub under_result: Option<BetResult>,
    pub state: MarketState,
    pub is_live: bool,
    pub provider: Option<String>,
    pub source: Option<SourceKind>,
}

fn grade(combined: f64, line: f64, over: bool) -> BetResult {
    if combined == line {
        BetResult::Push
    } else if (combined > line) == over {
        BetResult::Won
    } else {
        BetResult::Lost
    }
}

pub fn analyze_total(record: &MatchRecord, fields: &ResolvedMarketFields) -> TotalAnalysis {
    let t = &fields.total;
    let line = t.total.or(t.over_line).or(t.under_line);
    let over_line = t.over_line.or(t.total);
    let under_line = t.under_line.or(t.total);

    let settled = fields.phase == MatchPhase::Final && record.has_scores();
    let combined = record.home_score() + record.away_score();

    let outcome = line.filter(|_| settled).map(|l| {
        if combined > l {
            TotalOutcome::Over
        } else if combined < l {
            TotalOutcome::Under
        } else {
            TotalOutcome::Push
        }
    });
    let over_result = over_line.filter(|_| settled).map(|l| grade(combined, l, true));
    let under_result = under_line.filter(|_| settled).map(|l| grade(combined, l, false));

    TotalAnalysis {
        line,
        over_line,
        under_line,
        display: format_total(line),
        over_price: t.over_price,
        under_price: t.under_price,
        over_price_display: format_price(t.over_price),
        under_price_display: format_price(t.under_price),
        outcome,
        over_result,
        under_result,
        state: fields.phase.into(),
        is_live: fields.phase == MatchPhase::Live,
        provider: t.origin.as_ref().and_then(|o| o.provider.clone()),
        source: t.origin.as_ref().map(|o| o.source),
    }
}
