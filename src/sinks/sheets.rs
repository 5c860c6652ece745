//! Google Sheets record store.
//!
//! Talks to the Sheets REST API directly with a bearer access token:
//! `values:get` over the link column seeds the known-links set at run
//! start, `values:append` adds the run's accepted rows. Row shape is
//! `(date, keyword, title, link, source, relevance)`; the link column is
//! column D.

use crate::error::SinkError;
use crate::models::ReportedItem;
use crate::sinks::RecordStore;
use crate::utils::truncate_for_log;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, instrument};

const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Zero-based index of the link column within a row.
const LINK_COLUMN: usize = 3;

#[derive(Debug, Serialize)]
struct ValueRange {
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ValueRangeResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

pub struct SheetsRecordStore {
    client: reqwest::Client,
    spreadsheet_id: String,
    worksheet: String,
    access_token: String,
}

impl SheetsRecordStore {
    pub fn new(spreadsheet_id: String, worksheet: String, access_token: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            spreadsheet_id,
            worksheet,
            access_token,
        }
    }

    fn values_url(&self, suffix: &str) -> String {
        format!(
            "{API_BASE}/{}/values/{}{suffix}",
            self.spreadsheet_id,
            urlencoding::encode(&self.worksheet)
        )
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, SinkError> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            // Error bodies can be full HTML pages; keep them log-sized.
            let body = resp.text().await.unwrap_or_default();
            Err(SinkError::Api {
                status: status.as_u16(),
                message: truncate_for_log(&body, 512),
            })
        }
    }
}

#[async_trait]
impl RecordStore for SheetsRecordStore {
    #[instrument(level = "info", skip_all)]
    async fn list_known_links(&self) -> Result<HashSet<String>, SinkError> {
        let url = self.values_url("");
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        let range: ValueRangeResponse = resp
            .json()
            .await
            .map_err(|e| SinkError::Parse(e.to_string()))?;

        let links: HashSet<String> = range
            .values
            .into_iter()
            .filter_map(|row| row.into_iter().nth(LINK_COLUMN))
            .filter(|link| !link.is_empty())
            .collect();
        info!(count = links.len(), "Fetched known links from record store");
        Ok(links)
    }

    #[instrument(level = "info", skip_all, fields(rows = rows.len()))]
    async fn append_rows(&self, rows: &[ReportedItem]) -> Result<(), SinkError> {
        if rows.is_empty() {
            return Ok(());
        }
        let url = self.values_url(":append?valueInputOption=RAW&insertDataOption=INSERT_ROWS");
        let body = ValueRange {
            values: rows.iter().map(ReportedItem::as_row).collect(),
        };
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        Self::check(resp).await?;
        info!(rows = rows.len(), "Appended rows to record store");
        Ok(())
    }
}
