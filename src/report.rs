//! Slate evaluation and the plain-text rows the CLI prints.

use crate::config::Config;
use crate::engine::edge::{analyze_edge, EdgeAnalysis};
use crate::engine::market::{read_market, BetResult, MarketRead, MarketState};
use crate::feed::pregame::PregameBook;
use crate::feed::types::{MatchRecord, Slate};
use serde::Serialize;

/// Market read plus, for live matches with a payload, the edge bundle.
#[derive(Debug, Clone, Serialize)]
pub struct MatchEvaluation {
    pub match_id: String,
    pub market: MarketRead,
    pub edge: Option<EdgeAnalysis>,
}

/// Evaluate every match on the slate. The edge detector runs against the
/// live total the resolver picked, so it never sees a pregame number.
pub fn evaluate_slate(slate: &Slate, config: &Config) -> Vec<MatchEvaluation> {
    let book = PregameBook::from_expectations(slate.pregame.iter().cloned());
    slate
        .matches
        .iter()
        .map(|record| evaluate_match(record, slate, &book, config))
        .collect()
}

fn evaluate_match(record: &MatchRecord, slate: &Slate, book: &PregameBook, config: &Config) -> MatchEvaluation {
    let market = read_market(record);
    let edge = match (market.total.state, slate.live_for(&record.id)) {
        (MarketState::Live, Some(payload)) => Some(analyze_edge(
            payload,
            record.sport,
            book.get(&record.id),
            market.total.line,
            config,
        )),
        _ => None,
    };
    MatchEvaluation {
        match_id: record.id.clone(),
        market,
        edge,
    }
}

/// Report row data for CLI display
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub sport: String,
    pub matchup: String,
    pub state: String,
    pub spread: String,
    pub total: String,
    pub moneyline: String,
    pub result: String,
    pub recommendation: String,
}

fn result_label(result: Option<BetResult>) -> &'static str {
    match result {
        Some(BetResult::Won) => "W",
        Some(BetResult::Lost) => "L",
        Some(BetResult::Push) => "P",
        None => "-",
    }
}

fn state_label(state: MarketState) -> &'static str {
    match state {
        MarketState::Open => "Open",
        MarketState::Live => "Live",
        MarketState::Settled => "Settled",
    }
}

pub fn build_report_rows(slate: &Slate, evaluations: &[MatchEvaluation]) -> Vec<ReportRow> {
    slate
        .matches
        .iter()
        .zip(evaluations)
        .map(|(record, eval)| {
            let m = &eval.market;
            let spread = if m.spread.home_price.is_some() {
                format!("{} ({})", m.spread.home_display, m.spread.home_price_display)
            } else {
                m.spread.home_display.clone()
            };
            let moneyline = if m.moneyline.draw.is_some() {
                format!(
                    "{} / {} / {}",
                    m.moneyline.home_display, m.moneyline.draw_display, m.moneyline.away_display
                )
            } else {
                format!("{} / {}", m.moneyline.home_display, m.moneyline.away_display)
            };
            let result = if m.spread.state == MarketState::Settled {
                format!(
                    "ATS {} | O/U {} | ML {}",
                    result_label(m.spread.result),
                    result_label(m.total.over_result),
                    result_label(m.moneyline.result),
                )
            } else {
                "-".to_string()
            };
            let recommendation = eval
                .edge
                .as_ref()
                .map(|e| e.recommendation.clone())
                .unwrap_or_else(|| "-".to_string());

            ReportRow {
                sport: record.sport.key().to_uppercase(),
                matchup: format!("{} @ {}", record.away_team, record.home_team),
                state: state_label(m.spread.state).to_string(),
                spread,
                total: m.total.display.clone(),
                moneyline,
                result,
                recommendation,
            }
        })
        .collect()
}

/// Fixed-width table, one row per match.
pub fn render_table(rows: &[ReportRow]) -> String {
    let mut out = format!(
        "{:<7} {:<36} {:<8} {:<14} {:<7} {:<20} {:<22} {}\n",
        "SPORT", "MATCHUP", "STATE", "SPREAD(H)", "TOTAL", "ML H/A", "RESULT(H/OVER)", "EDGE"
    );
    for row in rows {
        out.push_str(&format!(
            "{:<7} {:<36} {:<8} {:<14} {:<7} {:<20} {:<22} {}\n",
            row.sport, row.matchup, row.state, row.spread, row.total, row.moneyline, row.result, row.recommendation
        ));
    }
    out
}
