//! Utility functions for keyword loading and string handling.

use std::io;
use tokio::fs;
use tracing::{info, instrument};

/// Load the keyword list from a plain-text file.
///
/// One keyword per line; surrounding whitespace is trimmed and blank lines
/// are skipped. Input order is preserved, since keywords are processed and
/// reported in file order.
///
/// # Arguments
///
/// * `path` - Path to the keyword file
///
/// # Errors
///
/// Returns an IO error if the file cannot be read. An unreadable keyword
/// list is a startup failure, not a per-run condition.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn load_keywords(path: &str) -> io::Result<Vec<String>> {
    let raw = fs::read_to_string(path).await?;
    let keywords: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    info!(count = keywords.len(), "Loaded keyword list");
    Ok(keywords)
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes with an ellipsis and byte
/// count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…(+{} bytes)", &s[..end], s.len() - end)
    }
}
