//! Yandex News search-page scraper.
//!
//! Scrapes the Yandex News search results page, which groups each story
//! into an `article` block with an `h2` headline and a link. The query
//! carries `from=day` so the provider itself scopes results to the last
//! day.
//!
//! # Link resolution
//!
//! Result links frequently use the provider-internal relative redirect
//! format (`/news/story/...`). These are rewritten to absolute URLs against
//! the provider base. With redirect resolution enabled, the adapter also
//! fetches the redirect target and takes the first anchor pointing off the
//! provider's own domain as the story's true external link, falling back to
//! the rewritten URL when no such anchor exists.

use crate::error::SourceError;
use crate::models::{Candidate, RunWindow, SourceKind};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

const BASE_URL: &str = "https://yandex.ru";
const USER_AGENT: &str = "Mozilla/5.0";

static RESULT_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static HEADLINE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

pub struct YandexNewsSource {
    client: reqwest::Client,
    base: Url,
    /// Follow provider-internal redirect pages to recover the external
    /// story link.
    resolve_redirects: bool,
}

impl YandexNewsSource {
    pub fn new(timeout: Duration, resolve_redirects: bool) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            // BASE_URL is a constant known-good URL.
            base: Url::parse(BASE_URL).expect("base url"),
            resolve_redirects,
        }
    }

    fn search_url(&self, keyword: &str) -> String {
        format!(
            "{BASE_URL}/news/search?text={}&from=day",
            urlencoding::encode(keyword)
        )
    }

    /// Extract (headline, href) pairs from the results page.
    fn parse_results(&self, html: &str) -> Vec<(String, Url)> {
        let document = Html::parse_document(html);
        let mut out = Vec::new();
        for block in document.select(&RESULT_SELECTOR) {
            let Some(headline) = block.select(&HEADLINE_SELECTOR).next() else {
                continue;
            };
            let Some(anchor) = block.select(&LINK_SELECTOR).next() else {
                continue;
            };
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let title = headline.text().collect::<Vec<_>>().join(" ");
            let title = title.trim().to_string();
            if title.is_empty() {
                continue;
            }
            // Absolute hrefs pass through Url::join untouched; relative
            // redirect paths get rewritten against the provider base.
            match self.base.join(href) {
                Ok(link) => out.push((title, link)),
                Err(e) => {
                    warn!(href, error = %e, "Discarding result with unresolvable href");
                }
            }
        }
        out
    }

    /// Fetch a provider-internal redirect page and return the first anchor
    /// pointing off the provider's domain, if any.
    async fn resolve_external_link(&self, link: &Url) -> Option<Url> {
        let html = self
            .client
            .get(link.as_str())
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?
            .text()
            .await
            .ok()?;
        let document = Html::parse_document(&html);
        for anchor in document.select(&LINK_SELECTOR) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Ok(target) = Url::parse(href) else {
                continue;
            };
            if let Some(host) = target.host_str() {
                if !is_provider_host(host) {
                    return Some(target);
                }
            }
        }
        None
    }
}

fn is_provider_host(host: &str) -> bool {
    host == "yandex.ru" || host.ends_with(".yandex.ru")
}

#[async_trait]
impl super::NewsSource for YandexNewsSource {
    #[instrument(level = "info", skip_all, fields(keyword = %keyword))]
    async fn search(
        &self,
        keyword: &str,
        _window: &RunWindow,
    ) -> Result<Vec<Candidate>, SourceError> {
        let url = self.search_url(keyword);
        debug!(%url, "Fetching search results");

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }
        let html = resp.text().await?;

        let results = self.parse_results(&html);
        if results.is_empty() {
            return Err(SourceError::Parse(
                "no result blocks found in search page".to_string(),
            ));
        }

        let mut candidates = Vec::with_capacity(results.len());
        for (title, link) in results {
            let link = if self.resolve_redirects && link.host_str().is_some_and(is_provider_host) {
                match self.resolve_external_link(&link).await {
                    Some(external) => external,
                    // Keep the rewritten redirect URL rather than discard
                    // the candidate.
                    None => link,
                }
            } else {
                link
            };
            candidates.push(Candidate {
                title,
                link,
                source: SourceKind::SearchEngine,
            });
        }

        info!(count = candidates.len(), "Parsed search results");
        Ok(candidates)
    }

    fn name(&self) -> &'static str {
        "yandex"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> YandexNewsSource {
        YandexNewsSource::new(Duration::from_secs(1), false)
    }

    #[test]
    fn search_url_encodes_keyword_and_sets_recency() {
        let url = source().search_url("новый закон");
        assert!(url.starts_with("https://yandex.ru/news/search?text="));
        assert!(url.ends_with("&from=day"));
        assert!(!url.contains(' '));
    }

    #[test]
    fn parse_results_extracts_headline_and_absolute_link() {
        let html = r#"
            <html><body>
              <article>
                <h2>Новые законы приняты</h2>
                <a href="https://some.outlet.example/story/1">read</a>
              </article>
              <article>
                <h2>Вторая новость</h2>
                <a href="/news/story/abcdef">read</a>
              </article>
            </body></html>"#;
        let results = source().parse_results(html);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "Новые законы приняты");
        assert_eq!(results[0].1.as_str(), "https://some.outlet.example/story/1");
        // Relative redirect path rewritten against the provider base.
        assert_eq!(results[1].1.as_str(), "https://yandex.ru/news/story/abcdef");
    }

    #[test]
    fn parse_results_skips_blocks_missing_headline_or_link() {
        let html = r#"
            <article><h2>No link here</h2></article>
            <article><a href="/news/x">no headline</a></article>
            <article><h2>Good</h2><a href="/news/y">read</a></article>"#;
        let results = source().parse_results(html);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "Good");
    }

    #[test]
    fn provider_host_detection() {
        assert!(is_provider_host("yandex.ru"));
        assert!(is_provider_host("news.yandex.ru"));
        assert!(!is_provider_host("example.com"));
        assert!(!is_provider_host("notyandex.ru"));
    }
}
