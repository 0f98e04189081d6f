use super::types::{lenient, PregameExpectation, Sport};
use crate::config::Config;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;

/// Where a match's baseline came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineSource {
    Supplied,
    SportDefault,
}

/// Pregame expectations keyed by match id.
#[derive(Debug, Clone, Default)]
pub struct PregameBook {
    by_match: HashMap<String, PregameExpectation>,
}

impl PregameBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_expectations(expectations: impl IntoIterator<Item = PregameExpectation>) -> Self {
        let mut book = Self::new();
        for expectation in expectations {
            book.insert(expectation);
        }
        book
    }

    /// Parse a JSON array of expectations. Rows missing their pace or
    /// efficiency are skipped; the match falls back to the sport default.
    pub fn from_json(json: &str) -> Result<Self> {
        let rows: Vec<serde_json::Value> =
            serde_json::from_str(json).context("failed to parse pregame expectations")?;
        Ok(Self::from_expectations(
            lenient::parse_rows::<PregameExpectation>(rows),
        ))
    }

    /// Later entries for the same match replace earlier ones. Entries without
    /// an id cannot be joined and are dropped.
    pub fn insert(&mut self, expectation: PregameExpectation) {
        if expectation.match_id.is_empty() {
            tracing::warn!("pregame expectation without match id ignored");
            return;
        }
        if expectation.expected_pace <= 0.0 || expectation.expected_efficiency <= 0.0 {
            tracing::warn!(
                match_id = %expectation.match_id,
                pace = expectation.expected_pace,
                efficiency = expectation.expected_efficiency,
                "pregame expectation with non-positive baseline ignored"
            );
            return;
        }
        self.by_match.insert(expectation.match_id.clone(), expectation);
    }

    pub fn get(&self, match_id: &str) -> Option<&PregameExpectation> {
        self.by_match.get(match_id)
    }

    pub fn len(&self) -> usize {
        self.by_match.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_match.is_empty()
    }

    /// The supplied baseline for the match, else the sport default.
    pub fn expectation_for(
        &self,
        match_id: &str,
        sport: Sport,
        config: &Config,
    ) -> (PregameExpectation, BaselineSource) {
        resolve_baseline(self.get(match_id), match_id, sport, config)
    }
}

/// A missing baseline is not an error: warn and fall back to the sport table.
pub fn resolve_baseline(
    supplied: Option<&PregameExpectation>,
    match_id: &str,
    sport: Sport,
    config: &Config,
) -> (PregameExpectation, BaselineSource) {
    match supplied {
        Some(expectation) => (expectation.clone(), BaselineSource::Supplied),
        None => {
            tracing::warn!(
                match_id = %match_id,
                sport = sport.key(),
                "no pregame baseline, using sport default"
            );
            let mut fallback = config.pregame_default(sport);
            fallback.match_id = match_id.to_string();
            (fallback, BaselineSource::SportDefault)
        }
    }
}
