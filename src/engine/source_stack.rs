use super::status::{classify_status_in_play, MatchPhase};
use crate::feed::types::{MatchRecord, OddsSnapshot};
use serde::{Deserialize, Serialize};

/// Which named snapshot of a match a source came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// `current_odds`: the live / most recent feed.
    Current,
    /// `odds`: pre-game consensus.
    Consensus,
    /// `opening_odds`.
    Opening,
    /// `closing_odds`.
    Closing,
}

/// One candidate source in priority order.
#[derive(Debug, Clone, Copy)]
pub struct OddsSource<'a> {
    pub kind: SourceKind,
    pub weight: u8,
    pub snapshot: &'a OddsSnapshot,
}

/// The ordered, phase-filtered list of sources for one match.
#[derive(Debug, Clone)]
pub struct SourceStack<'a> {
    pub phase: MatchPhase,
    pub sources: Vec<OddsSource<'a>>,
}

impl SourceStack<'_> {
    pub fn is_live(&self) -> bool {
        self.phase == MatchPhase::Live
    }

    pub fn is_final(&self) -> bool {
        self.phase == MatchPhase::Final
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Phase from the status string, promoted to live when the current snapshot
/// says it is in-play but the status has not caught up yet. A score on the
/// board means play has started.
pub fn match_phase(record: &MatchRecord) -> MatchPhase {
    let started = record.home_score() + record.away_score() > 0.0;
    match classify_status_in_play(&record.status, started) {
        MatchPhase::Scheduled
            if record
                .current_odds
                .as_ref()
                .is_some_and(OddsSnapshot::live_flag) =>
        {
            MatchPhase::Live
        }
        phase => phase,
    }
}

/// Build the weighted source stack for a match.
///
/// - final: closing (100), consensus as closing fallback (95)
/// - live: current only (100); pre-game numbers never describe a game in play
/// - scheduled: current (80), consensus (70), opening (40)
pub fn build_source_stack(record: &MatchRecord) -> SourceStack<'_> {
    let phase = match_phase(record);

    let candidates: Vec<(SourceKind, u8, Option<&OddsSnapshot>)> = match phase {
        MatchPhase::Final => vec![
            (SourceKind::Closing, 100, record.closing_odds.as_ref()),
            (SourceKind::Consensus, 95, record.odds.as_ref()),
        ],
        MatchPhase::Live => vec![(SourceKind::Current, 100, record.current_odds.as_ref())],
        MatchPhase::Scheduled => vec![
            (SourceKind::Current, 80, record.current_odds.as_ref()),
            (SourceKind::Consensus, 70, record.odds.as_ref()),
            (SourceKind::Opening, 40, record.opening_odds.as_ref()),
        ],
    };

    let mut sources: Vec<OddsSource<'_>> = candidates
        .into_iter()
        .filter_map(|(kind, weight, snapshot)| {
            snapshot.map(|snapshot| OddsSource { kind, weight, snapshot })
        })
        .collect();
    // Stable sort keeps declaration order on equal weights.
    sources.sort_by(|a, b| b.weight.cmp(&a.weight));

    SourceStack { phase, sources }
}
