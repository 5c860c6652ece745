//! # Newswatch
//!
//! A once-per-day batch pipeline that watches a configured set of keywords
//! across heterogeneous news sources and reports new mentions.
//!
//! ## Features
//!
//! - Queries an HTML-scraped search engine (Yandex News) and an RSS search
//!   feed (Google News) per keyword, scoped to yesterday's window
//! - Filters hits by lemma-based relevance so inflected headline forms
//!   still match, with an optional full-article scan policy
//! - Deduplicates against a durable ledger of everything ever reported
//! - Appends accepted rows to a Google Sheets record store and delivers a
//!   chunked summary to a Telegram chat
//!
//! ## Usage
//!
//! ```sh
//! newswatch -k keywords.txt -l reported_links.json
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Init**: Load keywords and the dedup ledger, snapshot known links
//! 2. **Fetch**: Query both source adapters per keyword, in parallel
//! 3. **Filter**: Relevance check, then dedup against ledger and store
//! 4. **Output**: Append rows, persist the ledger, notify in chunks

use chrono::FixedOffset;
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod cli;
mod error;
mod ledger;
mod models;
mod normalize;
mod relevance;
mod report;
mod scrapers;
mod sinks;
mod utils;

use aggregator::Aggregator;
use cli::Cli;
use error::ConfigError;
use ledger::Ledger;
use models::RunWindow;
use normalize::Normalizer;
use relevance::RelevanceFilter;
use scrapers::{NewsSource, google_news::GoogleNewsSource, yandex::YandexNewsSource};
use sinks::{Notifier, sheets::SheetsRecordStore, telegram::TelegramNotifier};
use utils::load_keywords;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("newswatch starting up");

    let args = Cli::parse();

    // --- Run window: yesterday in the configured civil offset ---
    let offset =
        FixedOffset::east_opt(args.utc_offset_hours * 3600).ok_or(ConfigError::Invalid {
            name: "utc-offset-hours",
            reason: format!("{} is not a valid offset", args.utc_offset_hours),
        })?;
    let window = RunWindow::yesterday(offset);
    info!(day = %window.day, offset_hours = args.utc_offset_hours, "Run window fixed");

    // --- Keywords ---
    let keywords = load_keywords(&args.keywords_file).await?;
    if keywords.is_empty() {
        return Err(Box::new(ConfigError::Invalid {
            name: "keywords-file",
            reason: format!("{} contains no keywords", args.keywords_file),
        }) as Box<dyn Error>);
    }

    // --- Record store (mandatory: the run's primary output) ---
    let spreadsheet_id = args
        .spreadsheet_id
        .ok_or(ConfigError::MissingCredential("SHEETS_SPREADSHEET_ID"))?;
    let sheets_token = args
        .sheets_token
        .ok_or(ConfigError::MissingCredential("SHEETS_ACCESS_TOKEN"))?;
    let store = SheetsRecordStore::new(spreadsheet_id, args.worksheet.clone(), sheets_token);

    // --- Notifier (optional: absence disables the sink) ---
    let notifier: Option<Box<dyn Notifier>> =
        match (args.telegram_bot_token, args.telegram_chat_id) {
            (Some(token), Some(chat_id)) => {
                info!("Telegram notifier configured");
                Some(Box::new(
                    TelegramNotifier::new(token, chat_id).with_retries(args.notify_retries),
                ))
            }
            _ => {
                warn!("Telegram credentials absent; notification disabled");
                None
            }
        };

    // --- Sources, filter, ledger ---
    let timeout = Duration::from_secs(args.fetch_timeout_secs);
    let sources: Vec<Box<dyn NewsSource>> = vec![
        Box::new(YandexNewsSource::new(timeout, args.resolve_redirects)),
        Box::new(GoogleNewsSource::new(timeout, args.language)),
    ];
    let filter = RelevanceFilter::new(args.relevance, Normalizer::new(args.language), timeout);
    let ledger = Ledger::load(&args.ledger_path).await;

    // --- Run ---
    let mut aggregator = Aggregator::new(
        sources,
        filter,
        ledger,
        Box::new(store),
        notifier,
        !args.cross_keyword_duplicates,
    );
    let summary = aggregator.run(&keywords, window).await;

    if summary.source_errors > 0 {
        warn!(
            source_errors = summary.source_errors,
            "Some source fetches failed; their keywords got partial coverage"
        );
    }
    if summary.chunks_failed > 0 {
        error!(chunks_failed = summary.chunks_failed, "Some notifier chunks were not delivered");
    }

    let elapsed = start_time.elapsed();
    info!(
        day = %window.day,
        keywords = summary.keywords,
        candidates = summary.candidates,
        irrelevant = summary.irrelevant,
        duplicates = summary.duplicates,
        accepted = summary.accepted,
        chunks_sent = summary.chunks_sent,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
