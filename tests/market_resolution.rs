// Integration tests for multi-source market resolution and settlement

#[cfg(test)]
mod tests {
    use odds_edge::engine::market::{read_market, BetResult, MarketState, Side};
    use odds_edge::engine::source_stack::SourceKind;
    use odds_edge::feed::odds_parser::{parse_odds_value, OddsKind};
    use odds_edge::feed::types::MatchRecord;
    use serde_json::json;

    fn record(value: serde_json::Value) -> MatchRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_read_is_pure_and_idempotent() {
        let r = record(json!({
            "id": "m1",
            "sport": "nfl",
            "status": "STATUS_SCHEDULED",
            "current_odds": { "homeSpread": "-3 (-115)", "total": "O 44.5", "provider": "Book A" },
            "odds": { "homeML": -160, "awayML": "+140" },
            "opening_odds": { "homeSpread": -2.5 }
        }));
        let first = serde_json::to_string(&read_market(&r)).unwrap();
        let second = serde_json::to_string(&read_market(&r)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_mixing_spread_line_with_other_books_juice() {
        let r = record(json!({
            "status": "pre",
            "current_odds": { "homeSpread": -3.5, "provider": "Book A" },
            "odds": { "homeSpread": -2.5, "homeSpreadOdds": -105, "awaySpreadOdds": -115 }
        }));
        let read = read_market(&r);
        assert_eq!(read.spread.home_line, Some(-3.5));
        assert_eq!(read.spread.home_price, None);
        assert_eq!(read.spread.away_price, None);
        assert_eq!(read.spread.source, Some(SourceKind::Current));
        assert_eq!(read.spread.provider.as_deref(), Some("Book A"));
    }

    #[test]
    fn test_live_exclusivity_with_empty_current() {
        let r = record(json!({
            "sport": "nhl",
            "status": "STATUS_IN_PROGRESS",
            "homeScore": 2,
            "awayScore": 1,
            "current_odds": {},
            "odds": { "homeSpread": -1.5, "total": 6.5, "homeML": -150, "awayML": 130 },
            "opening_odds": { "total": 6.0 }
        }));
        let read = read_market(&r);
        assert_eq!(read.spread.state, MarketState::Live);
        assert_eq!(read.spread.home_line, None);
        assert_eq!(read.spread.home_display, "-");
        assert_eq!(read.total.line, None);
        assert_eq!(read.total.display, "-");
        assert_eq!(read.moneyline.home, None);
        assert_eq!(read.moneyline.home_display, "-");
    }

    #[test]
    fn test_live_exclusivity_with_absent_current() {
        let r = record(json!({
            "status": "HALFTIME",
            "odds": { "total": 221.5 }
        }));
        let read = read_market(&r);
        assert_eq!(read.total.line, None);
        assert!(read.total.is_live);
    }

    #[test]
    fn test_spread_guard() {
        assert_eq!(parse_odds_value(&json!(150), OddsKind::Spread), None);
        assert_eq!(parse_odds_value(&json!(-7.5), OddsKind::Spread), Some(-7.5));
    }

    #[test]
    fn test_sign_correction_end_to_end() {
        let r = record(json!({
            "status": "STATUS_SCHEDULED",
            "odds": { "homeML": -200, "awayML": 170, "homeSpread": 4.5, "awaySpread": -4.5 }
        }));
        let read = read_market(&r);
        assert_eq!(read.spread.home_line, Some(-4.5));
        assert_eq!(read.spread.away_line, Some(4.5));
        assert!(read.spread.corrected);
        assert_eq!(read.spread.favored, Some(Side::Home));
        assert_eq!(read.moneyline.favorite, Some(Side::Home));
    }

    #[test]
    fn test_settlement_epsilon_push() {
        let r = record(json!({
            "status": "STATUS_FINAL",
            "homeScore": 110,
            "awayScore": 100,
            "closing_odds": { "homeSpread": -10, "total": 210 }
        }));
        let read = read_market(&r);
        assert_eq!(read.spread.state, MarketState::Settled);
        assert_eq!(read.spread.result, Some(BetResult::Push));
        assert_eq!(read.spread.result_for(Side::Away), Some(BetResult::Push));
        assert_eq!(read.total.over_result, Some(BetResult::Push));
    }

    #[test]
    fn test_final_falls_back_to_consensus_not_opening() {
        let r = record(json!({
            "status": "FT",
            "sport": "soccer_epl",
            "homeScore": 1,
            "awayScore": 1,
            "odds": { "homeML": 150, "awayML": 180, "drawML": 220 },
            "opening_odds": { "total": 2.5 }
        }));
        let read = read_market(&r);
        assert_eq!(read.moneyline.source, Some(SourceKind::Consensus));
        assert_eq!(read.moneyline.result, Some(BetResult::Lost));
        assert_eq!(read.total.line, None);
    }

    #[test]
    fn test_hockey_puck_line_default_from_moneyline() {
        let r = record(json!({
            "sport": "icehockey_nhl",
            "status": "scheduled",
            "odds": { "homeML": "+135", "awayML": "-160", "total": "5.5" }
        }));
        let read = read_market(&r);
        assert!(read.spread.defaulted);
        assert_eq!(read.spread.home_display, "+1.5");
        assert_eq!(read.spread.away_display, "-1.5");
    }

    #[test]
    fn test_suspended_mid_game_never_reads_opening_lines() {
        let r = record(json!({
            "sport": "mlb",
            "status": "STATUS_SUSPENDED",
            "homeScore": 3,
            "awayScore": 2,
            "current_odds": {},
            "opening_odds": { "total": 8.5 }
        }));
        let read = read_market(&r);
        assert_eq!(read.total.state, MarketState::Live);
        assert_eq!(read.total.line, None);
        assert_eq!(read.total.source, None);
    }

    #[test]
    fn test_snapshot_live_flag_forces_live_read() {
        let r = record(json!({
            "status": "STATUS_SCHEDULED",
            "current_odds": { "isLive": true, "total": 48.5 },
            "odds": { "total": 44.5, "homeSpread": -3 }
        }));
        let read = read_market(&r);
        assert_eq!(read.total.state, MarketState::Live);
        assert_eq!(read.total.line, Some(48.5));
        assert_eq!(read.spread.home_line, None);
    }
}
