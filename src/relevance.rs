//! Relevance filtering of candidates against keywords.
//!
//! Two policies share one contract:
//!
//! - **Lemma containment** (default): both keyword and headline are run
//!   through the [`Normalizer`] and the candidate is relevant iff the
//!   normalized keyword appears as a contiguous substring of the normalized
//!   headline. Multi-word keywords match as phrases, not as a bag of words.
//! - **Full article scan**: the candidate's page is fetched, markup is
//!   stripped, and the raw lower-cased keyword is matched against the
//!   lower-cased body. Used when headline text alone is too sparse. Any
//!   fetch or parse failure fails closed: the candidate is treated as not
//!   relevant and the keyword loop continues.
//!
//! The filter never mutates its inputs and holds only a read-only stemmer
//! and an HTTP client, so independent `(candidate, keyword)` checks may run
//! concurrently.

use crate::models::Candidate;
use crate::normalize::Normalizer;
use scraper::Html;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Which relevance check to apply, selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RelevancePolicy {
    /// Normalized-keyword containment in the normalized headline.
    Lemma,
    /// Raw-keyword containment in the fetched article body.
    Article,
}

pub struct RelevanceFilter {
    policy: RelevancePolicy,
    normalizer: Normalizer,
    client: reqwest::Client,
}

impl RelevanceFilter {
    pub fn new(policy: RelevancePolicy, normalizer: Normalizer, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            policy,
            normalizer,
            client,
        }
    }

    /// Decide whether `candidate` is a true hit for `keyword`.
    #[instrument(level = "debug", skip_all, fields(keyword = %keyword, link = %candidate.link))]
    pub async fn is_relevant(&self, candidate: &Candidate, keyword: &str) -> bool {
        match self.policy {
            RelevancePolicy::Lemma => self.title_contains_lemmas(&candidate.title, keyword),
            RelevancePolicy::Article => self.article_contains_keyword(candidate, keyword).await,
        }
    }

    fn title_contains_lemmas(&self, title: &str, keyword: &str) -> bool {
        let needle = self.normalizer.normalize(keyword);
        if needle.is_empty() {
            return false;
        }
        let haystack = self.normalizer.normalize(title);
        let hit = haystack.contains(&needle);
        debug!(%needle, %haystack, hit, "Lemma containment check");
        hit
    }

    /// Fetch the article body and scan it for the raw keyword. Fail-closed:
    /// a network or parse failure means "not relevant", never an error.
    async fn article_contains_keyword(&self, candidate: &Candidate, keyword: &str) -> bool {
        let body = match self.fetch_page(candidate.link.as_str()).await {
            Ok(body) => body,
            Err(e) => {
                warn!(link = %candidate.link, error = %e, "Article fetch failed; treating as not relevant");
                return false;
            }
        };
        let text = strip_markup(&body).to_lowercase();
        text.contains(&keyword.to_lowercase())
    }

    async fn fetch_page(&self, url: &str) -> Result<String, reqwest::Error> {
        let resp = self.client.get(url).send().await?.error_for_status()?;
        resp.text().await
    }
}

/// Flatten an HTML document to its visible text.
fn strip_markup(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;
    use crate::normalize::Language;

    fn filter(policy: RelevancePolicy, language: Language) -> RelevanceFilter {
        RelevanceFilter::new(policy, Normalizer::new(language), Duration::from_secs(1))
    }

    fn candidate(title: &str) -> Candidate {
        Candidate {
            title: title.to_string(),
            link: url::Url::parse("https://example.com/story").unwrap(),
            source: SourceKind::SearchEngine,
        }
    }

    #[tokio::test]
    async fn inflected_headline_matches_keyword() {
        let f = filter(RelevancePolicy::Lemma, Language::En);
        assert!(f.is_relevant(&candidate("New Laws Passed"), "new law").await);
    }

    #[tokio::test]
    async fn unrelated_headline_does_not_match() {
        let f = filter(RelevancePolicy::Lemma, Language::En);
        assert!(!f.is_relevant(&candidate("Weather update"), "election").await);
    }

    #[tokio::test]
    async fn multi_word_keyword_matches_as_phrase_not_bag() {
        let f = filter(RelevancePolicy::Lemma, Language::En);
        // Both lemmas present but not contiguous.
        assert!(!f.is_relevant(&candidate("Law about new tax"), "new law").await);
    }

    #[tokio::test]
    async fn russian_inflection_matches() {
        let f = filter(RelevancePolicy::Lemma, Language::Ru);
        assert!(
            f.is_relevant(&candidate("Новые законы приняты в регионах"), "новый закон")
                .await
        );
    }

    #[tokio::test]
    async fn empty_keyword_never_matches() {
        let f = filter(RelevancePolicy::Lemma, Language::En);
        assert!(!f.is_relevant(&candidate("Anything at all"), "  ").await);
    }

    #[tokio::test]
    async fn article_scan_fails_closed_on_unreachable_host() {
        let f = filter(RelevancePolicy::Article, Language::En);
        let c = Candidate {
            title: "irrelevant".to_string(),
            link: url::Url::parse("http://127.0.0.1:1/article").unwrap(),
            source: SourceKind::FeedReader,
        };
        assert!(!f.is_relevant(&c, "keyword").await);
    }

    #[test]
    fn strip_markup_drops_tags() {
        let text = strip_markup("<html><body><p>New <b>laws</b> passed</p></body></html>");
        assert!(text.contains("New"));
        assert!(text.contains("laws"));
        assert!(!text.contains('<'));
    }
}
