// ── Feed HTTP client ──
//
// Fetches the public schedule page. The page serves browsers, so the
// request carries ordinary browser-ish headers; some hosts reject bare
// default user agents.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use tracing::debug;
use url::Url;

use voltwatch_core::{CoreError, Outage, watcher::OutageSource};

use crate::error::FeedError;
use crate::parse::parse_schedule;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:129.0) Gecko/20100101 Firefox/129.0";

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Full URL of the regional schedule page.
    pub url: Url,
    /// Request timeout.
    pub timeout: Duration,
}

impl FeedConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client for the outage-schedule page.
pub struct FeedClient {
    http: reqwest::Client,
    config: FeedConfig,
}

impl FeedClient {
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { http, config })
    }

    /// Fetch and parse the current schedule page.
    pub async fn fetch_schedule(&self) -> Result<Vec<Outage>, FeedError> {
        let response = self
            .http
            .get(self.config.url.clone())
            .header("Accept", "text/html,application/xhtml+xml")
            .header("Accept-Language", "en-US,en;q=0.5")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        debug!(bytes = html.len(), url = %self.config.url, "schedule page fetched");

        parse_schedule(&html, Local::now().date_naive())
    }

    /// Wrap this client in an `Arc<dyn OutageSource>` for the watcher.
    pub fn into_source(self) -> Arc<dyn OutageSource> {
        Arc::new(self)
    }
}

#[async_trait]
impl OutageSource for FeedClient {
    async fn fetch(&self) -> Result<Vec<Outage>, CoreError> {
        self.fetch_schedule().await.map_err(CoreError::from)
    }
}
