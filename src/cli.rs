//! Command-line interface definitions.
//!
//! All options can be provided via command-line flags; credentials can also
//! come from environment variables, which is how scheduled runs supply
//! them.

use crate::normalize::Language;
use crate::relevance::RelevancePolicy;
use clap::Parser;

/// Command-line arguments for the newswatch run.
///
/// # Examples
///
/// ```sh
/// # Default run: keywords.txt, Russian stemming, lemma relevance
/// newswatch
///
/// # Stricter relevance, English feeds, custom paths
/// newswatch -k watchlist.txt -l ./state/ledger.json --relevance article --language en
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Keyword list file, one keyword per line
    #[arg(short, long, default_value = "keywords.txt")]
    pub keywords_file: String,

    /// Path of the dedup ledger snapshot
    #[arg(short, long, default_value = "reported_links.json")]
    pub ledger_path: String,

    /// Spreadsheet id of the record store
    #[arg(long, env = "SHEETS_SPREADSHEET_ID")]
    pub spreadsheet_id: Option<String>,

    /// OAuth access token for the record store
    #[arg(long, env = "SHEETS_ACCESS_TOKEN", hide_env_values = true)]
    pub sheets_token: Option<String>,

    /// Worksheet (tab) name within the spreadsheet
    #[arg(long, env = "SHEETS_WORKSHEET", default_value = "Sheet1")]
    pub worksheet: String,

    /// Telegram bot token; omit to disable notification
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_bot_token: Option<String>,

    /// Telegram chat id to deliver the summary to
    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    pub telegram_chat_id: Option<String>,

    /// Civil offset (hours east of UTC) used to compute the run window
    #[arg(long, default_value_t = 3)]
    pub utc_offset_hours: i32,

    /// Relevance policy
    #[arg(long, value_enum, default_value_t = RelevancePolicy::Lemma)]
    pub relevance: RelevancePolicy,

    /// Stemming language for keyword/headline normalization
    #[arg(long, value_enum, default_value_t = Language::Ru)]
    pub language: Language,

    /// Follow provider-internal redirects to recover external story links
    #[arg(long)]
    pub resolve_redirects: bool,

    /// Allow a link accepted under one keyword to be reported again under
    /// a later keyword in the same run
    #[arg(long)]
    pub cross_keyword_duplicates: bool,

    /// Attempts per notifier chunk before it is counted as failed
    #[arg(long, default_value_t = 3)]
    pub notify_retries: u8,

    /// Network timeout for source fetches, in seconds
    #[arg(long, default_value_t = 10)]
    pub fetch_timeout_secs: u64,
}
