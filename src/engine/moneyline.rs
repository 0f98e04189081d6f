use super::market::{format_price, BetResult, MarketState, Side};
use super::resolver::ResolvedMarketFields;
use super::source_stack::SourceKind;
use super::status::MatchPhase;
use crate::feed::types::MatchRecord;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Home,
    Away,
    Draw,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoneylineAnalysis {
    pub home: Option<f64>,
    pub away: Option<f64>,
    pub draw: Option<f64>,
    pub home_display: String,
    pub away_display: String,
    pub draw_display: String,
    pub favorite: Option<Side>,
    /// Vig-free win probabilities (three-way when a draw price exists).
    pub home_probability: Option<f64>,
    pub away_probability: Option<f64>,
    pub draw_probability: Option<f64>,
    pub winner: Option<Winner>,
    /// Settlement of the home price; see [`MoneylineAnalysis::result_for`].
    pub result: Option<BetResult>,
    pub state: MarketState,
    pub is_live: bool,
    pub provider: Option<String>,
    pub source: Option<SourceKind>,
}

impl MoneylineAnalysis {
    /// A tie loses a three-way price and pushes a two-way one.
    pub fn result_for(&self, side: Side) -> Option<BetResult> {
        let winner = self.winner?;
        Some(match (winner, side) {
            (Winner::Home, Side::Home) | (Winner::Away, Side::Away) => BetResult::Won,
            (Winner::Home, Side::Away) | (Winner::Away, Side::Home) => BetResult::Lost,
            (Winner::Draw, _) if self.draw.is_some() => BetResult::Lost,
            (Winner::Draw, _) => BetResult::Push,
        })
    }
}

/// Favorite is the numerically lower American price. This covers the usual
/// -150/+130 shape and the all-positive "even match" (+105/+115).
pub fn moneyline_favorite(home: Option<f64>, away: Option<f64>) -> Option<Side> {
    let (home, away) = (home?, away?);
    if home < away {
        Some(Side::Home)
    } else if away < home {
        Some(Side::Away)
    } else {
        None
    }
}

/// Convert American odds to implied probability.
/// Positive odds (e.g., +150): prob = 100 / (odds + 100)
/// Negative odds (e.g., -150): prob = |odds| / (|odds| + 100)
/// Prices inside (-100, +100) are not American odds.
pub fn american_to_probability(odds: f64) -> Option<f64> {
    if odds >= 100.0 {
        Some(100.0 / (odds + 100.0))
    } else if odds <= -100.0 {
        let abs = odds.abs();
        Some(abs / (abs + 100.0))
    } else {
        None
    }
}

/// Devig a set of prices to fair probabilities. Any unusable price voids the
/// whole set.
pub fn devig(prices: &[f64]) -> Option<Vec<f64>> {
    let implied: Vec<f64> = prices
        .iter()
        .map(|&p| american_to_probability(p))
        .collect::<Option<_>>()?;
    let total: f64 = implied.iter().sum();
    if total <= 0.0 {
        return None;
    }
    Some(implied.iter().map(|p| p / total).collect())
}

pub fn analyze_moneyline(record: &MatchRecord, fields: &ResolvedMarketFields) -> MoneylineAnalysis {
    let ml = &fields.moneyline;

    let (home_probability, away_probability, draw_probability) = match (ml.home, ml.away, ml.draw) {
        (Some(h), Some(a), Some(d)) => match devig(&[h, a, d]).as_deref() {
            Some(&[ph, pa, pd]) => (Some(ph), Some(pa), Some(pd)),
            _ => (None, None, None),
        },
        (Some(h), Some(a), None) => match devig(&[h, a]).as_deref() {
            Some(&[ph, pa]) => (Some(ph), Some(pa), None),
            _ => (None, None, None),
        },
        _ => (None, None, None),
    };

    let winner = if fields.phase == MatchPhase::Final && record.has_scores() {
        let (home, away) = (record.home_score(), record.away_score());
        Some(if home > away {
            Winner::Home
        } else if away > home {
            Winner::Away
        } else {
            Winner::Draw
        })
    } else {
        None
    };

    let mut analysis = MoneylineAnalysis {
        home: ml.home,
        away: ml.away,
        draw: ml.draw,
        home_display: format_price(ml.home),
        away_display: format_price(ml.away),
        draw_display: format_price(ml.draw),
        favorite: moneyline_favorite(ml.home, ml.away),
        home_probability,
        away_probability,
        draw_probability,
        winner,
        result: None,
        state: fields.phase.into(),
        is_live: fields.phase == MatchPhase::Live,
        provider: ml.origin.as_ref().and_then(|o| o.provider.clone()),
        source: ml.origin.as_ref().map(|o| o.source),
    };
    if ml.home.is_some() {
        analysis.result = analysis.result_for(Side::Home);
    }
    analysis
}
