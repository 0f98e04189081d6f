use super::types::Slate;
use super::MatchFeed;
use crate::config::FeedConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::time::{Duration, Instant};

/// Upper bound on the 429 backoff.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Polls one URL that serves a whole slate document.
pub struct HttpSlateFeed {
    client: Client,
    url: String,
    live_interval: Duration,
    pre_game_interval: Duration,
    poll_interval: Duration,
    /// Cadence before any 429 backoff.
    base_interval: Duration,
    last_fetch: Option<Instant>,
    last_etag: Option<String>,
    last_success: Option<DateTime<Utc>>,
}

/// Double the interval, capped.
fn backed_off(current: Duration) -> Duration {
    current.saturating_mul(2).min(MAX_BACKOFF)
}

impl HttpSlateFeed {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .context("failed to build HTTP client")?;
        let pre_game_interval = Duration::from_secs(config.pre_game_poll_interval_s);
        Ok(Self {
            client,
            url: config.url.clone(),
            live_interval: Duration::from_secs(config.live_poll_interval_s),
            pre_game_interval,
            poll_interval: pre_game_interval,
            base_interval: pre_game_interval,
            last_fetch: None,
            last_etag: None,
            last_success: None,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.last_success
    }
}

#[async_trait]
impl MatchFeed for HttpSlateFeed {
    async fn fetch_slate(&mut self) -> Result<Option<Slate>> {
        if let Some(last) = self.last_fetch {
            let elapsed = last.elapsed();
            if elapsed < self.poll_interval {
                tokio::time::sleep(self.poll_interval - elapsed).await;
            }
        }

        let mut req = self.client.get(&self.url);
        if let Some(ref etag) = self.last_etag {
            req = req.header("If-None-Match", etag.as_str());
        }

        let resp = req
            .send()
            .await
            .with_context(|| format!("slate request failed: {}", self.url))?;
        self.last_fetch = Some(Instant::now());

        if resp.status() == reqwest::StatusCode::NOT_MODIFIED {
            return Ok(None);
        }

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            self.poll_interval = backed_off(self.poll_interval);
            tracing::warn!(
                interval_s = self.poll_interval.as_secs(),
                "slate feed rate limited (429), backing off"
            );
            anyhow::bail!("slate feed rate limited (429)");
        }

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("slate feed error ({}): {}", status, body);
        }

        self.poll_interval = self.base_interval;

        if let Some(etag) = resp.headers().get("etag") {
            self.last_etag = etag.to_str().ok().map(|s| s.to_string());
        }

        let body = resp.text().await.context("failed to read slate body")?;
        let slate = Slate::from_json(&body)?;
        self.last_success = Some(Utc::now());
        tracing::debug!(matches = slate.matches.len(), live = slate.live.len(), "slate fetched");
        Ok(Some(slate))
    }

    fn set_live_cadence(&mut self, live: bool) {
        let interval = if live {
            self.live_interval
        } else {
            self.pre_game_interval
        };
        if interval != self.base_interval {
            tracing::info!(live, interval_s = interval.as_secs(), "poll cadence changed");
            self.base_interval = interval;
            self.poll_interval = interval;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FeedConfig {
        FeedConfig {
            url: "http://localhost:1/slate.json".into(),
            live_poll_interval_s: 3,
            pre_game_poll_interval_s: 30,
            request_timeout_ms: 1000,
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(backed_off(Duration::from_secs(3)), Duration::from_secs(6));
        assert_eq!(backed_off(Duration::from_secs(40)), MAX_BACKOFF);
    }

    #[test]
    fn test_starts_on_pre_game_cadence() {
        let feed = HttpSlateFeed::new(&config()).unwrap();
        assert_eq!(feed.poll_interval(), Duration::from_secs(30));
        assert!(feed.last_success().is_none());
    }

    #[test]
    fn test_live_cadence_switch() {
        let mut feed = HttpSlateFeed::new(&config()).unwrap();
        feed.set_live_cadence(true);
        assert_eq!(feed.poll_interval(), Duration::from_secs(3));
        feed.set_live_cadence(false);
        assert_eq!(feed.poll_interval(), Duration::from_secs(30));
    }
}
