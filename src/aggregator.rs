//! Run orchestration: the keyword loop and sink fan-out.
//!
//! A run moves through `Init → (PerKeyword)* → Flush → Notify → Done`:
//!
//! 1. **Init**: pull the record store's known links once and load the
//!    dedup ledger.
//! 2. **PerKeyword**: fan out to every source adapter in parallel, fan the
//!    results back in on this task, merge, relevance-filter, drop links
//!    already reported, accept the survivors.
//! 3. **Flush**: append accepted rows to the record store (a placeholder
//!    row if nothing was accepted) and persist the ledger exactly once.
//! 4. **Notify**: render, chunk, and deliver the summary.
//!
//! Failure policy throughout: a failing adapter contributes nothing for
//! that keyword, a failing sink is logged and the remaining sinks still
//! run, and nothing short of startup misconfiguration aborts a run. The
//! ledger and the accepted batch only ever grow during the keyword loop,
//! and all mutation happens on this task after the parallel fetches for a
//! keyword complete.

use crate::ledger::Ledger;
use crate::models::{Candidate, ReportedItem, RunSummary, RunWindow};
use crate::relevance::RelevanceFilter;
use crate::report;
use crate::scrapers::NewsSource;
use crate::sinks::{Notifier, RecordStore};
use itertools::Itertools;
use std::collections::HashSet;
use tracing::{debug, error, info, instrument, warn};

pub struct Aggregator {
    sources: Vec<Box<dyn NewsSource>>,
    filter: RelevanceFilter,
    ledger: Ledger,
    store: Box<dyn RecordStore>,
    notifier: Option<Box<dyn Notifier>>,
    /// Suppress a link for the rest of the run once any keyword claims it.
    /// Switchable off to restore history-only deduplication.
    dedup_within_run: bool,
}

impl Aggregator {
    pub fn new(
        sources: Vec<Box<dyn NewsSource>>,
        filter: RelevanceFilter,
        ledger: Ledger,
        store: Box<dyn RecordStore>,
        notifier: Option<Box<dyn Notifier>>,
        dedup_within_run: bool,
    ) -> Self {
        Self {
            sources,
            filter,
            ledger,
            store,
            notifier,
            dedup_within_run,
        }
    }

    /// Execute one full run over `keywords` for the given window.
    #[instrument(level = "info", skip_all, fields(day = %window.day, keywords = keywords.len()))]
    pub async fn run(&mut self, keywords: &[String], window: RunWindow) -> RunSummary {
        let mut summary = RunSummary {
            keywords: keywords.len(),
            ..RunSummary::default()
        };

        // Init: one snapshot of already-recorded links. A failure here
        // degrades to an empty set; the ledger still covers prior runs.
        let known = match self.store.list_known_links().await {
            Ok(links) => links,
            Err(e) => {
                warn!(error = %e, "Could not list known links; relying on ledger only");
                HashSet::new()
            }
        };
        info!(known = known.len(), ledger = self.ledger.len(), "Run initialized");

        let mut rows: Vec<ReportedItem> = Vec::new();
        let mut accepted_this_run: HashSet<String> = HashSet::new();

        for keyword in keywords {
            let merged = self.fetch_keyword(keyword, &window, &mut summary).await;
            summary.candidates += merged.len();

            for candidate in merged {
                if !self.filter.is_relevant(&candidate, keyword).await {
                    summary.irrelevant += 1;
                    continue;
                }

                let link = candidate.link.to_string();
                let in_history = known.contains(&link) || self.ledger.contains(&link);
                let repeat_within_run = accepted_this_run.contains(&link);
                let blocked = if self.dedup_within_run {
                    in_history
                } else {
                    in_history && !repeat_within_run
                };
                if blocked {
                    debug!(%link, "Link already reported; skipping");
                    summary.duplicates += 1;
                    continue;
                }

                self.ledger.insert(&link);
                accepted_this_run.insert(link.clone());
                rows.push(ReportedItem {
                    date: window.day,
                    keyword: keyword.clone(),
                    title: candidate.title,
                    link,
                    source: Some(candidate.source),
                    relevant: true,
                });
            }
        }
        summary.accepted = rows.len();
        info!(
            accepted = summary.accepted,
            irrelevant = summary.irrelevant,
            duplicates = summary.duplicates,
            "Keyword loop complete"
        );

        self.flush(&rows, window).await;
        self.notify(&rows, window, &mut summary).await;
        summary
    }

    /// Parallel fan-out over all sources for one keyword; fan-in happens
    /// here, on the caller's task. Merged results are de-duplicated by
    /// link, keeping source order.
    async fn fetch_keyword(
        &self,
        keyword: &str,
        window: &RunWindow,
        summary: &mut RunSummary,
    ) -> Vec<Candidate> {
        let fetches = self
            .sources
            .iter()
            .map(|source| async move { (source.name(), source.search(keyword, window).await) });
        let results = futures::future::join_all(fetches).await;

        let mut merged: Vec<Candidate> = Vec::new();
        for (name, result) in results {
            match result {
                Ok(candidates) => {
                    debug!(source = name, keyword, count = candidates.len(), "Source contribution");
                    merged.extend(candidates);
                }
                Err(e) => {
                    warn!(source = name, keyword, error = %e, "Source failed; contributing nothing");
                    summary.source_errors += 1;
                }
            }
        }
        merged
            .into_iter()
            .unique_by(|c| c.link.to_string())
            .collect()
    }

    /// Write accepted rows to the record store and persist the ledger.
    /// Store errors are reported but never retried within the run, and the
    /// notifier still gets its chance afterwards.
    async fn flush(&self, rows: &[ReportedItem], window: RunWindow) {
        let flush_rows: Vec<ReportedItem> = if rows.is_empty() {
            info!("No rows accepted; writing placeholder row");
            vec![ReportedItem::placeholder(window.day)]
        } else {
            rows.to_vec()
        };

        if let Err(e) = self.store.append_rows(&flush_rows).await {
            error!(error = %e, rows = flush_rows.len(), "Record store append failed");
        }

        // Single persist per run, after all per-keyword processing. The
        // placeholder row never entered the ledger.
        if let Err(e) = self.ledger.persist().await {
            error!(error = %e, "Ledger persist failed");
        }
    }

    /// Deliver the chunked summary. A failed chunk does not stop the rest.
    async fn notify(&self, rows: &[ReportedItem], window: RunWindow, summary: &mut RunSummary) {
        let Some(notifier) = &self.notifier else {
            info!("Notifier not configured; skipping notification");
            return;
        };

        let chunks = if rows.is_empty() {
            vec![report::render_no_results(window.day)]
        } else {
            let entries: Vec<String> = rows
                .iter()
                .enumerate()
                .map(|(i, item)| report::render_entry(i + 1, item))
                .collect();
            report::chunk_entries(
                &entries,
                &report::render_header(window.day, rows.len()),
                &report::render_footer(rows.len()),
                report::MAX_MESSAGE_LEN,
            )
        };

        for (i, chunk) in chunks.iter().enumerate() {
            match notifier.send(chunk).await {
                Ok(()) => summary.chunks_sent += 1,
                Err(e) => {
                    error!(chunk = i, error = %e, "Notifier chunk failed; continuing with the rest");
                    summary.chunks_failed += 1;
                }
            }
        }
        info!(
            sent = summary.chunks_sent,
            failed = summary.chunks_failed,
            "Notification complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SinkError, SourceError};
    use crate::models::SourceKind;
    use crate::normalize::{Language, Normalizer};
    use crate::relevance::RelevancePolicy;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct StubSource {
        kind: SourceKind,
        results: Vec<(String, String)>,
        fail: bool,
    }

    #[async_trait]
    impl NewsSource for StubSource {
        async fn search(
            &self,
            _keyword: &str,
            _window: &RunWindow,
        ) -> Result<Vec<Candidate>, SourceError> {
            if self.fail {
                return Err(SourceError::Status(503));
            }
            Ok(self
                .results
                .iter()
                .map(|(title, link)| Candidate {
                    title: title.clone(),
                    link: url::Url::parse(link).unwrap(),
                    source: self.kind,
                })
                .collect())
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    /// Record store stand-in; the `appended` handle stays with the test so
    /// it can inspect what the aggregator wrote.
    #[derive(Default)]
    struct MemoryStore {
        known: std::collections::HashSet<String>,
        appended: Arc<Mutex<Vec<ReportedItem>>>,
        fail_append: bool,
    }

    impl MemoryStore {
        fn capturing() -> (Self, Arc<Mutex<Vec<ReportedItem>>>) {
            let store = Self::default();
            let handle = store.appended.clone();
            (store, handle)
        }
    }

    #[async_trait]
    impl crate::sinks::RecordStore for MemoryStore {
        async fn list_known_links(&self) -> Result<std::collections::HashSet<String>, SinkError> {
            Ok(self.known.clone())
        }

        async fn append_rows(&self, rows: &[ReportedItem]) -> Result<(), SinkError> {
            if self.fail_append {
                return Err(SinkError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            self.appended.lock().unwrap().extend_from_slice(rows);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryNotifier {
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl MemoryNotifier {
        fn capturing() -> (Self, Arc<Mutex<Vec<String>>>) {
            let notifier = Self::default();
            let handle = notifier.sent.clone();
            (notifier, handle)
        }
    }

    #[async_trait]
    impl Notifier for MemoryNotifier {
        async fn send(&self, text: &str) -> Result<(), SinkError> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn filter() -> RelevanceFilter {
        RelevanceFilter::new(
            RelevancePolicy::Lemma,
            Normalizer::new(Language::En),
            Duration::from_secs(1),
        )
    }

    fn test_ledger(name: &str) -> Ledger {
        Ledger::empty(std::env::temp_dir().join(format!("newswatch_agg_{name}.json")))
    }

    fn window() -> RunWindow {
        RunWindow::for_day(NaiveDate::from_ymd_opt(2025, 5, 6).unwrap())
    }

    fn source(kind: SourceKind, results: &[(&str, &str)]) -> Box<dyn NewsSource> {
        Box::new(StubSource {
            kind,
            results: results
                .iter()
                .map(|(t, l)| (t.to_string(), l.to_string()))
                .collect(),
            fail: false,
        })
    }

    #[tokio::test]
    async fn first_keyword_claims_a_shared_link() {
        // Both keywords match the same story; only the first claims it.
        let (store, appended) = MemoryStore::capturing();
        let sources = vec![source(
            SourceKind::SearchEngine,
            &[("Election and new laws", "https://a.example/1")],
        )];
        let mut agg = Aggregator::new(
            sources,
            filter(),
            test_ledger("shared"),
            Box::new(store),
            None,
            true,
        );
        let summary = agg
            .run(&["election".to_string(), "new law".to_string()], window())
            .await;

        assert_eq!(summary.accepted, 1);
        assert_eq!(summary.duplicates, 1);
        let appended = appended.lock().unwrap();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].keyword, "election");
    }

    #[tokio::test]
    async fn known_links_are_never_reemitted() {
        let (mut store, appended) = MemoryStore::capturing();
        store.known.insert("https://a.example/old".to_string());
        let sources = vec![source(
            SourceKind::FeedReader,
            &[
                ("Election news", "https://a.example/old"),
                ("Election update", "https://a.example/new"),
            ],
        )];
        let mut agg = Aggregator::new(
            sources,
            filter(),
            test_ledger("known"),
            Box::new(store),
            None,
            true,
        );
        let summary = agg.run(&["election".to_string()], window()).await;

        assert_eq!(summary.accepted, 1);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(appended.lock().unwrap()[0].link, "https://a.example/new");
    }

    #[tokio::test]
    async fn zero_results_produce_placeholder_row_and_message() {
        let (store, appended) = MemoryStore::capturing();
        let (notifier, sent) = MemoryNotifier::capturing();
        let sources = vec![source(SourceKind::SearchEngine, &[])];
        let mut agg = Aggregator::new(
            sources,
            filter(),
            test_ledger("empty"),
            Box::new(store),
            Some(Box::new(notifier)),
            true,
        );
        let summary = agg.run(&["election".to_string()], window()).await;

        assert_eq!(summary.accepted, 0);
        let appended = appended.lock().unwrap();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].keyword, "-");
        assert!(!appended[0].relevant);

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("no new results"));
        assert_eq!(summary.chunks_sent, 1);
    }

    #[tokio::test]
    async fn store_failure_does_not_block_notifier() {
        let store = MemoryStore {
            fail_append: true,
            ..MemoryStore::default()
        };
        let (notifier, sent) = MemoryNotifier::capturing();
        let sources = vec![source(
            SourceKind::SearchEngine,
            &[("Election result", "https://a.example/1")],
        )];
        let mut agg = Aggregator::new(
            sources,
            filter(),
            test_ledger("storefail"),
            Box::new(store),
            Some(Box::new(notifier)),
            true,
        );
        let summary = agg.run(&["election".to_string()], window()).await;

        assert_eq!(summary.accepted, 1);
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("https://a.example/1"));
    }

    #[tokio::test]
    async fn one_failing_source_leaves_the_other_intact() {
        let (store, appended) = MemoryStore::capturing();
        let sources: Vec<Box<dyn NewsSource>> = vec![
            Box::new(StubSource {
                kind: SourceKind::SearchEngine,
                results: vec![],
                fail: true,
            }),
            source(
                SourceKind::FeedReader,
                &[("Election feed item", "https://b.example/1")],
            ),
        ];
        let mut agg = Aggregator::new(
            sources,
            filter(),
            test_ledger("srcfail"),
            Box::new(store),
            None,
            true,
        );
        let summary = agg.run(&["election".to_string()], window()).await;

        assert_eq!(summary.source_errors, 1);
        assert_eq!(summary.accepted, 1);
        assert_eq!(
            appended.lock().unwrap()[0].source,
            Some(SourceKind::FeedReader)
        );
    }

    #[tokio::test]
    async fn irrelevant_candidates_are_filtered() {
        let sources = vec![source(
            SourceKind::SearchEngine,
            &[("Weather update", "https://a.example/1")],
        )];
        let mut agg = Aggregator::new(
            sources,
            filter(),
            test_ledger("irrelevant"),
            Box::new(MemoryStore::default()),
            None,
            true,
        );
        let summary = agg.run(&["election".to_string()], window()).await;

        assert_eq!(summary.irrelevant, 1);
        assert_eq!(summary.accepted, 0);
    }

    #[tokio::test]
    async fn cross_keyword_duplicates_allowed_when_configured() {
        let (store, appended) = MemoryStore::capturing();
        let sources = vec![source(
            SourceKind::SearchEngine,
            &[("Election and new laws", "https://a.example/1")],
        )];
        let mut agg = Aggregator::new(
            sources,
            filter(),
            test_ledger("crossdup"),
            Box::new(store),
            None,
            false,
        );
        let summary = agg
            .run(&["election".to_string(), "new law".to_string()], window())
            .await;

        assert_eq!(summary.accepted, 2);
        let appended = appended.lock().unwrap();
        assert_eq!(appended.len(), 2);
        assert_eq!(appended[0].keyword, "election");
        assert_eq!(appended[1].keyword, "new law");
    }

    #[tokio::test]
    async fn rows_are_keyword_major_then_source_major() {
        let (store, appended) = MemoryStore::capturing();
        let sources: Vec<Box<dyn NewsSource>> = vec![
            source(
                SourceKind::SearchEngine,
                &[("Election search hit", "https://a.example/search")],
            ),
            source(
                SourceKind::FeedReader,
                &[("Election feed hit", "https://a.example/feed")],
            ),
        ];
        let mut agg = Aggregator::new(
            sources,
            filter(),
            test_ledger("order"),
            Box::new(store),
            None,
            true,
        );
        agg.run(&["election".to_string()], window()).await;

        let appended = appended.lock().unwrap();
        assert_eq!(appended.len(), 2);
        assert_eq!(appended[0].source, Some(SourceKind::SearchEngine));
        assert_eq!(appended[1].source, Some(SourceKind::FeedReader));
    }

    #[tokio::test]
    async fn accepted_links_survive_in_the_persisted_ledger() {
        let path = std::env::temp_dir().join("newswatch_agg_persist.json");
        let _ = tokio::fs::remove_file(&path).await;
        let sources = vec![source(
            SourceKind::SearchEngine,
            &[("Election story", "https://a.example/1")],
        )];
        let mut agg = Aggregator::new(
            sources,
            filter(),
            Ledger::empty(&path),
            Box::new(MemoryStore::default()),
            None,
            true,
        );
        agg.run(&["election".to_string()], window()).await;

        let reloaded = Ledger::load(&path).await;
        assert!(reloaded.contains("https://a.example/1"));
        let _ = tokio::fs::remove_file(&path).await;
    }
}
