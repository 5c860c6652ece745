//! Source adapters for fetching keyword mentions from news providers.
//!
//! Each adapter fetches and parses one provider's result shape and emits a
//! sequence of [`Candidate`]s. Results are not restartable: every call
//! performs a fresh fetch.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Yandex News | [`yandex`] | HTML scraping | Search results page, last-day recency filter |
//! | Google News | [`google_news`] | RSS search feed | `after:` day qualifier, locale parameters |
//!
//! # Common Patterns
//!
//! Every adapter implements [`NewsSource`]:
//! - `search(keyword, window)`: one query, one result sequence
//! - relative links resolved to absolute URLs before a candidate is emitted
//! - fetch and parse failures surface as [`SourceError`] and are absorbed
//!   by the orchestrator as an empty contribution, never a run abort

use crate::error::SourceError;
use crate::models::{Candidate, RunWindow};
use async_trait::async_trait;

pub mod google_news;
pub mod yandex;

/// A provider of keyword search results, normalized to [`Candidate`]s.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Query the provider for mentions of `keyword` within the run window.
    /// Every emitted candidate carries its [`crate::models::SourceKind`].
    async fn search(&self, keyword: &str, window: &RunWindow)
    -> Result<Vec<Candidate>, SourceError>;

    /// Short provider name for logs.
    fn name(&self) -> &'static str;
}
