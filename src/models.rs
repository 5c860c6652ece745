//! Data models for the keyword watch pipeline.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Candidate`]: An unvalidated search hit as emitted by a source adapter
//! - [`ReportedItem`]: The accepted unit persisted to the record store
//! - [`RunWindow`]: The single calendar day a run is scoped to
//! - [`RunSummary`]: Counters describing what a run did, for the epilogue log
//!
//! Every source adapter, whatever its wire format, normalizes its results
//! into [`Candidate`] values before they leave the adapter. The `link` field
//! is a parsed [`url::Url`], so a candidate cannot carry a relative link past
//! the adapter boundary.

use chrono::{Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which kind of source produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// HTML-scraped search engine results.
    SearchEngine,
    /// Entries from an RSS search feed.
    FeedReader,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::SearchEngine => write!(f, "search"),
            SourceKind::FeedReader => write!(f, "feed"),
        }
    }
}

/// A search hit produced by a source adapter, before relevance and dedup
/// filtering.
///
/// The `link` is always an absolute URL: adapters resolve relative hrefs
/// against their provider's base URL before constructing a `Candidate`.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Headline text as published by the source.
    pub title: String,
    /// Absolute link to the story.
    pub link: url::Url,
    /// Which adapter emitted this candidate.
    pub source: SourceKind,
}

/// An accepted result, as persisted to the record store.
///
/// At most one `ReportedItem` is produced per distinct link within a run:
/// the first keyword to claim a link wins, later keywords skip it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportedItem {
    /// The run-window day, never the day of execution.
    pub date: NaiveDate,
    /// The keyword that claimed this link.
    pub keyword: String,
    /// Headline text.
    pub title: String,
    /// Absolute link, already validated upstream. Empty for the
    /// zero-results placeholder row.
    pub link: String,
    /// Originating adapter; `None` for the placeholder row.
    pub source: Option<SourceKind>,
    /// Whether the item passed the relevance filter. Always `true` for
    /// real rows, `false` for the placeholder.
    pub relevant: bool,
}

impl ReportedItem {
    /// The placeholder row written when a run accepts nothing, so the
    /// record store has an unambiguous entry for the day.
    pub fn placeholder(date: NaiveDate) -> Self {
        Self {
            date,
            keyword: "-".to_string(),
            title: "No results for this day".to_string(),
            link: String::new(),
            source: None,
            relevant: false,
        }
    }

    /// Spreadsheet row shape: date, keyword, title, link, source, relevance.
    pub fn as_row(&self) -> Vec<String> {
        vec![
            self.date.to_string(),
            self.keyword.clone(),
            self.title.clone(),
            self.link.clone(),
            self.source.map(|s| s.to_string()).unwrap_or_default(),
            if self.relevant { "yes" } else { "no" }.to_string(),
        ]
    }
}

/// The single calendar day a run is scoped to.
///
/// Computed once at process start as "the day before the current day" in a
/// fixed civil offset, and passed unchanged to every adapter and into every
/// persisted row. Execution time past midnight never shifts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunWindow {
    pub day: NaiveDate,
}

impl RunWindow {
    /// Yesterday in the given fixed offset.
    pub fn yesterday(offset: FixedOffset) -> Self {
        let local = Utc::now().with_timezone(&offset);
        Self {
            day: local.date_naive() - Duration::days(1),
        }
    }

    /// A window pinned to an explicit day (tests, replays).
    pub fn for_day(day: NaiveDate) -> Self {
        Self { day }
    }
}

/// Counters describing a finished run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Keywords processed.
    pub keywords: usize,
    /// Candidates seen across all sources before any filtering.
    pub candidates: usize,
    /// Candidates rejected by the relevance filter.
    pub irrelevant: usize,
    /// Candidates dropped because their link was already reported.
    pub duplicates: usize,
    /// Rows accepted into the batch (placeholder excluded).
    pub accepted: usize,
    /// Adapter calls that failed and contributed nothing.
    pub source_errors: usize,
    /// Notifier chunks delivered.
    pub chunks_sent: usize,
    /// Notifier chunks that failed to deliver.
    pub chunks_failed: usize,
}
