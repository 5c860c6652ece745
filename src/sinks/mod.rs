//! Reporting sinks consumed by the aggregator.
//!
//! | Sink | Module | Transport | Role |
//! |------|--------|-----------|------|
//! | Record store | [`sheets`] | Google Sheets REST | Durable tabular output, known-link lookups |
//! | Notifier | [`telegram`] | Telegram Bot API | Human-readable chunked summary |
//!
//! The aggregator talks to both through the traits below, so the pipeline
//! is testable with in-memory stand-ins. One sink failing must not block
//! the other: sink errors are logged and counted, never propagated into
//! the keyword loop.

use crate::error::SinkError;
use crate::models::ReportedItem;
use async_trait::async_trait;
use std::collections::HashSet;

pub mod sheets;
pub mod telegram;

/// Persistent tabular storage for accepted rows.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Links already recorded in prior runs. Read once at run start to
    /// seed the dedup check.
    async fn list_known_links(&self) -> Result<HashSet<String>, SinkError>;

    /// Append the run's accepted rows, in order.
    async fn append_rows(&self, rows: &[ReportedItem]) -> Result<(), SinkError>;
}

/// Delivery channel for the human-readable summary.
///
/// `text` must already respect the provider's message-length ceiling; the
/// aggregator chunks before sending.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), SinkError>;
}
