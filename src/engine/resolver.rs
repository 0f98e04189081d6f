//! Market field resolution over a weighted source stack.
//!
//! Each market group (spread, total, moneyline) is resolved independently:
//! the first source, in weight order, that yields any field of the group
//! supplies every field of the group. Fields are never stitched together from
//! two sources, so a spread line is never paired with another book's juice.

use super::source_stack::{SourceKind, SourceStack};
use super::status::MatchPhase;
use crate::feed::odds_parser::{parse_odds_value, OddsKind};
use serde::{Deserialize, Serialize};

/// One canonical field and every key it may hide under.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: OddsKind,
    pub aliases: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct MarketGroup<const N: usize> {
    pub name: &'static str,
    pub fields: [FieldSpec; N],
}

pub const SPREAD_GROUP: MarketGroup<4> = MarketGroup {
    name: "spread",
    fields: [
        FieldSpec {
            name: "home_spread",
            kind: OddsKind::Spread,
            aliases: &[
                "homeSpread", "home_spread", "spreadHome", "spread_home", "spread.home",
                "spreads.home", "homeLine", "home_line", "spread",
            ],
        },
        FieldSpec {
            name: "away_spread",
            kind: OddsKind::Spread,
            aliases: &[
                "awaySpread", "away_spread", "spreadAway", "spread_away", "spread.away",
                "spreads.away", "awayLine", "away_line",
            ],
        },
        FieldSpec {
            name: "home_spread_price",
            kind: OddsKind::Price,
            aliases: &[
                "homeSpreadOdds", "home_spread_odds", "homeSpreadPrice", "home_spread_price",
                "homeSpreadJuice", "spread.homeOdds", "spread.home_odds", "spread.homePrice",
            ],
        },
        FieldSpec {
            name: "away_spread_price",
            kind: OddsKind::Price,
            aliases: &[
                "awaySpreadOdds", "away_spread_odds", "awaySpreadPrice", "away_spread_price",
                "awaySpreadJuice", "spread.awayOdds", "spread.away_odds", "spread.awayPrice",
            ],
        },
    ],
};

pub const TOTAL_GROUP: MarketGroup<5> = MarketGroup {
    name: "total",
    fields: [
        FieldSpec {
            name: "total",
            kind: OddsKind::Total,
            aliases: &[
                "total", "overUnder", "over_under", "totalLine", "total_line", "total.line",
                "totals.line", "totals.point",
            ],
        },
        FieldSpec {
            name: "over_line",
            kind: OddsKind::Total,
            aliases: &["overLine", "over_line", "totalOver", "total_over", "total.over"],
        },
        FieldSpec {
            name: "under_line",
            kind: OddsKind::Total,
            aliases: &["underLine", "under_line", "totalUnder", "total_under", "total.under"],
        },
        FieldSpec {
            name: "over_price",
            kind: OddsKind::Price,
            aliases: &[
                "overOdds", "over_odds", "overPrice", "over_price", "total.overOdds",
                "total.over_odds", "totals.overOdds",
            ],
        },
        FieldSpec {
            name: "under_price",
            kind: OddsKind::Price,
            aliases: &[
                "underOdds", "under_odds", "underPrice", "under_price", "total.underOdds",
                "total.under_odds", "totals.underOdds",
            ],
        },
    ],
};

pub const MONEYLINE_GROUP: MarketGroup<3> = MarketGroup {
    name: "moneyline",
    fields: [
        FieldSpec {
            name: "home_ml",
            kind: OddsKind::Price,
            aliases: &[
                "homeML", "homeMl", "home_ml", "homeMoneyline", "home_moneyline",
                "moneylineHome", "moneyline.home", "h2h.home",
            ],
        },
        FieldSpec {
            name: "away_ml",
            kind: OddsKind::Price,
            aliases: &[
                "awayML", "awayMl", "away_ml", "awayMoneyline", "away_moneyline",
                "moneylineAway", "moneyline.away", "h2h.away",
            ],
        },
        FieldSpec {
            name: "draw_ml",
            kind: OddsKind::Price,
            aliases: &[
                "drawML", "drawMl", "draw_ml", "drawMoneyline", "draw_moneyline",
                "moneyline.draw", "h2h.draw",
            ],
        },
    ],
};

/// Where a resolved group came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOrigin {
    pub source: SourceKind,
    pub provider: Option<String>,
}

/// Raw output of resolving one group: values in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRead<const N: usize> {
    pub values: [Option<f64>; N],
    pub origin: Option<FieldOrigin>,
}

/// Resolve one market group against the stack.
pub fn resolve_group<const N: usize>(
    stack: &SourceStack<'_>,
    group: &MarketGroup<N>,
) -> GroupRead<N> {
    for source in &stack.sources {
        let values = group.fields.map(|field| {
            field.aliases.iter().find_map(|alias| {
                source
                    .snapshot
                    .lookup(alias)
                    .and_then(|raw| parse_odds_value(raw, field.kind))
            })
        });
        if values.iter().any(Option::is_some) {
            let origin = FieldOrigin {
                source: source.kind,
                provider: source.snapshot.provider(),
            };
            tracing::debug!(
                group = group.name,
                source = ?origin.source,
                provider = origin.provider.as_deref().unwrap_or("-"),
                "market group resolved"
            );
            return GroupRead {
                values,
                origin: Some(origin),
            };
        }
    }
    GroupRead {
        values: [None; N],
        origin: None,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpreadFields {
    pub home: Option<f64>,
    pub away: Option<f64>,
    pub home_price: Option<f64>,
    pub away_price: Option<f64>,
    pub origin: Option<FieldOrigin>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TotalFields {
    pub total: Option<f64>,
    pub over_line: Option<f64>,
    pub under_line: Option<f64>,
    pub over_price: Option<f64>,
    pub under_price: Option<f64>,
    pub origin: Option<FieldOrigin>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoneylineFields {
    pub home: Option<f64>,
    pub away: Option<f64>,
    pub draw: Option<f64>,
    pub origin: Option<FieldOrigin>,
}

/// Spread, total and moneyline fields, each internally single-sourced.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMarketFields {
    pub phase: MatchPhase,
    pub spread: SpreadFields,
    pub total: TotalFields,
    pub moneyline: MoneylineFields,
}

impl ResolvedMarketFields {
    /// True when some group found data in the stack.
    pub fn has_any_market(&self) -> bool {
        self.spread.origin.is_some() || self.total.origin.is_some() || self.moneyline.origin.is_some()
    }
}

pub fn resolve_market_fields(stack: &SourceStack<'_>) -> ResolvedMarketFields {
    let spread = resolve_group(stack, &SPREAD_GROUP);
    let [home, away, home_price, away_price] = spread.values;

    let total = resolve_group(stack, &TOTAL_GROUP);
    let [line, over_line, under_line, over_price, under_price] = total.values;

    let moneyline = resolve_group(stack, &MONEYLINE_GROUP);
    let [home_ml, away_ml, draw_ml] = moneyline.values;

    ResolvedMarketFields {
        phase: stack.phase,
        spread: SpreadFields {
            home,
            away,
            home_price,
            away_price,
            origin: spread.origin,
        },
        total: TotalFields {
            total: line,
            over_line,
            under_line,
            over_price,
            under_price,
            origin: total.origin,
        },
        moneyline: MoneylineFields {
            home: home_ml,
            away: away_ml,
            draw: draw_ml,
            origin: moneyline.origin,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::source_stack::build_source_stack;
    use crate::feed::types::{MatchRecord, OddsSnapshot};
    use serde_json::json;

    fn snap(v: serde_json::Value) -> Option<OddsSnapshot> {
        OddsSnapshot::from_value(v)
    }

    #[test]
    fn test_group_never_mixes_sources() {
        // current has only the home spread; consensus has both sides and juice.
        let record = MatchRecord {
            status: "STATUS_SCHEDULED".into(),
            current_odds: snap(json!({ "homeSpread": -3.5, "provider": "Live Book" })),
            odds: snap(json!({
                "homeSpread": -2.5,
                "awaySpread": 2.5,
                "homeSpreadOdds": -110,
                "awaySpreadOdds": -110
            })),
            ..Default::default()
        };
        let stack = build_source_stack(&record);
        let fields = resolve_market_fields(&stack);
        assert_eq!(fields.spread.home, Some(-3.5));
        assert_eq!(fields.spread.away, None);
        assert_eq!(fields.spread.home_price, None);
        assert_eq!(fields.spread.away_price, None);
        let origin = fields.spread.origin.unwrap();
        assert_eq!(origin.source, SourceKind::Current);
        assert_eq!(origin.provider.as_deref(), Some("Live Book"));
    }

    #[test]
    fn test_groups_resolve_independently() {
        let record = MatchRecord {
            status: "pre".into(),
            current_odds: snap(json!({ "total": "O 221.5" })),
            odds: snap(json!({ "homeML": "-150", "awayML": "+130", "total": 219.5 })),
            ..Default::default()
        };
        let stack = build_source_stack(&record);
        let fields = resolve_market_fields(&stack);
        assert_eq!(fields.total.total, Some(221.5));
        assert_eq!(fields.total.origin.unwrap().source, SourceKind::Current);
        assert_eq!(fields.moneyline.home, Some(-150.0));
        assert_eq!(fields.moneyline.away, Some(130.0));
        assert_eq!(fields.moneyline.origin.unwrap().source, SourceKind::Consensus);
        assert!(fields.spread.origin.is_none());
    }

    #[test]
    fn test_unparseable_fields_fall_through_to_next_source() {
        let record = MatchRecord {
            status: "STATUS_SCHEDULED".into(),
            current_odds: snap(json!({ "homeSpread": "N/A", "awaySpread": 150 })),
            opening_odds: snap(json!({ "homeSpread": -1.5 })),
            ..Default::default()
        };
        let stack = build_source_stack(&record);
        let fields = resolve_market_fields(&stack);
        assert_eq!(fields.spread.home, Some(-1.5));
        assert_eq!(fields.spread.origin.unwrap().source, SourceKind::Opening);
    }

    #[test]
    fn test_dotted_aliases() {
        let record = MatchRecord {
            status: "STATUS_SCHEDULED".into(),
            current_odds: snap(json!({
                "spread": { "home": -6.5, "away": 6.5, "homeOdds": -105 },
                "moneyline": { "home": -280, "away": 230 }
            })),
            ..Default::default()
        };
        let stack = build_source_stack(&record);
        let fields = resolve_market_fields(&stack);
        assert_eq!(fields.spread.home, Some(-6.5));
        assert_eq!(fields.spread.away, Some(6.5));
        assert_eq!(fields.spread.home_price, Some(-105.0));
        assert_eq!(fields.moneyline.home, Some(-280.0));
    }

    #[test]
    fn test_empty_stack_yields_nothing() {
        let record = MatchRecord {
            status: "LIVE".into(),
            opening_odds: snap(json!({ "homeSpread": -1.5, "total": 44.5 })),
            ..Default::default()
        };
        let stack = build_source_stack(&record);
        let fields = resolve_market_fields(&stack);
        assert!(!fields.has_any_market());
        assert_eq!(fields.spread, SpreadFields::default());
        assert_eq!(fields.total, TotalFields::default());
    }
}
