pub mod http_feed;
pub mod live_state;
pub mod odds_parser;
pub mod pregame;
pub mod types;

use anyhow::Result;
use async_trait::async_trait;
use types::Slate;

#[async_trait]
pub trait MatchFeed: Send + Sync {
    /// Next slate, or `None` when nothing changed since the last fetch.
    async fn fetch_slate(&mut self) -> Result<Option<Slate>>;
    /// Poll faster while any match is in play.
    fn set_live_cadence(&mut self, live: bool);
}
