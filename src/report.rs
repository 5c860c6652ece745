//! Rendering and chunking of the notifier summary.
//!
//! The notifier transport has a hard per-message ceiling
//! ([`MAX_MESSAGE_LEN`], 4096 characters for the reference integration).
//! Each accepted item renders to one entry; entries are packed greedily
//! into successive chunks so that no chunk exceeds the ceiling, counting
//! the header on every chunk and the summary footer appended only to the
//! final chunk. An entry is never split across chunks, so meaning units
//! stay intact.
//!
//! Entry text is HTML-escaped because the transport interprets messages as
//! lightly-marked-up HTML; an unescaped `<` in a headline would otherwise
//! break the whole message.

use crate::models::ReportedItem;

/// Provider message-length ceiling, in characters.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Escape characters meaningful to the message markup.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render one accepted item as a numbered entry.
///
/// Shows title, link, and the keyword that claimed the item. The link is
/// escaped too: a raw `&` in a query string reads as a broken entity and
/// the transport rejects the whole message.
pub fn render_entry(index: usize, item: &ReportedItem) -> String {
    format!(
        "{}. <a href=\"{}\">{}</a> — {}\n",
        index,
        escape_html(&item.link),
        escape_html(&item.title),
        escape_html(&item.keyword),
    )
}

/// Header line for every chunk of a day's report.
pub fn render_header(day: chrono::NaiveDate, total: usize) -> String {
    format!("News mentions for {day} ({total} items)\n")
}

/// Footer appended to the final chunk only.
pub fn render_footer(total: usize) -> String {
    format!("\nTotal: {total} new mentions")
}

/// Message sent when a run accepts nothing.
pub fn render_no_results(day: chrono::NaiveDate) -> String {
    format!("News mentions for {day}: no new results")
}

/// Pack rendered entries greedily into chunks of at most `max_len`
/// characters.
///
/// Every chunk starts with `header`; `footer` is appended to the last chunk
/// only, and the packing accounts for it so the final chunk still fits. An
/// oversized single entry is truncated rather than dropped.
pub fn chunk_entries(entries: &[String], header: &str, footer: &str, max_len: usize) -> Vec<String> {
    let header_len = header.chars().count();
    let footer_len = footer.chars().count();

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::from(header);
    let mut current_len = header_len;
    let mut current_has_entries = false;

    for entry in entries {
        let mut entry = entry.clone();
        let mut entry_len = entry.chars().count();

        // A single entry larger than a whole chunk cannot be packed; cut it
        // down so it still gets delivered.
        let room = max_len.saturating_sub(header_len + footer_len);
        if entry_len > room {
            entry = entry.chars().take(room.saturating_sub(1)).collect();
            entry.push('…');
            entry_len = entry.chars().count();
        }

        if current_has_entries && current_len + entry_len + footer_len > max_len {
            chunks.push(current);
            current = String::from(header);
            current_len = header_len;
            current_has_entries = false;
        }

        current.push_str(&entry);
        current_len += entry_len;
        current_has_entries = true;
    }

    if current_has_entries {
        chunks.push(current);
    }

    if let Some(last) = chunks.last_mut() {
        last.push_str(footer);
    }
    chunks
}
