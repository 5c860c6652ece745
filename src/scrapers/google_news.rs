//! Google News RSS search-feed adapter.
//!
//! Builds a search-feed URL embedding the keyword and an `after:` day
//! qualifier plus locale parameters, and emits one [`Candidate`] per feed
//! entry. Feed links are already absolute and are used verbatim; the rare
//! entry with a non-absolute link is skipped so the candidate invariant
//! holds. Malformed feeds never raise past the adapter boundary — they
//! surface as [`SourceError::Parse`], which the orchestrator absorbs.

use crate::error::SourceError;
use crate::models::{Candidate, RunWindow, SourceKind};
use crate::normalize::Language;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

const BASE_URL: &str = "https://news.google.com/rss/search";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
}

pub struct GoogleNewsSource {
    client: reqwest::Client,
    language: Language,
}

impl GoogleNewsSource {
    pub fn new(timeout: Duration, language: Language) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; newswatch/0.1)")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, language }
    }

    /// Locale query parameters for the feed, derived from the stemming
    /// language so both ends of the pipeline agree on the target language.
    fn locale_params(&self) -> &'static str {
        match self.language {
            Language::Ru => "hl=ru&gl=RU&ceid=RU:ru",
            Language::En => "hl=en-US&gl=US&ceid=US:en",
        }
    }

    fn feed_url(&self, keyword: &str, window: &RunWindow) -> String {
        // Embedded line breaks would corrupt the query.
        let keyword = keyword.replace(['\r', '\n'], " ");
        let query = format!("{keyword} after:{}", window.day);
        format!(
            "{BASE_URL}?q={}&{}",
            urlencoding::encode(&query),
            self.locale_params()
        )
    }

    fn parse_feed(xml: &str) -> Result<Vec<Candidate>, SourceError> {
        let rss: Rss = quick_xml::de::from_str(xml)
            .map_err(|e| SourceError::Parse(format!("feed deserialization failed: {e}")))?;

        let mut candidates = Vec::with_capacity(rss.channel.items.len());
        for item in rss.channel.items {
            let (Some(title), Some(link)) = (item.title, item.link) else {
                continue;
            };
            let title = title.trim().to_string();
            if title.is_empty() {
                continue;
            }
            match Url::parse(link.trim()) {
                Ok(link) => candidates.push(Candidate {
                    title,
                    link,
                    source: SourceKind::FeedReader,
                }),
                Err(e) => {
                    warn!(link = %link, error = %e, "Skipping feed entry with non-absolute link");
                }
            }
        }
        Ok(candidates)
    }
}

#[async_trait]
impl super::NewsSource for GoogleNewsSource {
    #[instrument(level = "info", skip_all, fields(keyword = %keyword, day = %window.day))]
    async fn search(
        &self,
        keyword: &str,
        window: &RunWindow,
    ) -> Result<Vec<Candidate>, SourceError> {
        let url = self.feed_url(keyword, window);
        debug!(%url, "Fetching search feed");

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }
        let xml = resp.text().await?;

        let candidates = Self::parse_feed(&xml)?;
        info!(count = candidates.len(), "Parsed feed entries");
        Ok(candidates)
    }

    fn name(&self) -> &'static str {
        "google-news"
    }
}
