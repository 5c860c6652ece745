//! Durable deduplication ledger.
//!
//! The ledger is the set of every link reported in any prior run plus the
//! current one. It is loaded once at run start, mutated in memory as links
//! are accepted, and serialized back exactly once at the end of the run.
//! The aggregator owns it exclusively for the run's duration.
//!
//! # Persistence
//!
//! The snapshot is a JSON array of link strings. A missing or corrupt
//! snapshot is never fatal: it loads as an empty ledger with a warning, and
//! the next successful run rewrites it. Writes go to a temp file in the
//! same directory followed by a rename, so a crash mid-write cannot leave a
//! truncated snapshot behind.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

#[derive(Debug)]
pub struct Ledger {
    links: HashSet<String>,
    path: PathBuf,
}

impl Ledger {
    /// Load the ledger snapshot from `path`.
    ///
    /// Absence or corruption yields an empty ledger, never an error.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let links = match fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(list) => {
                    let links: HashSet<String> = list.into_iter().collect();
                    info!(count = links.len(), "Loaded dedup ledger");
                    links
                }
                Err(e) => {
                    warn!(error = %e, "Ledger snapshot is corrupt; starting with empty ledger");
                    HashSet::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No ledger snapshot found; starting with empty ledger");
                HashSet::new()
            }
            Err(e) => {
                warn!(error = %e, "Ledger snapshot unreadable; starting with empty ledger");
                HashSet::new()
            }
        };
        Self { links, path }
    }

    /// An empty in-memory ledger that persists to `path`.
    pub fn empty(path: impl AsRef<Path>) -> Self {
        Self {
            links: HashSet::new(),
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn contains(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    /// Record a link as reported. Returns `true` if it was not present.
    pub fn insert(&mut self, link: &str) -> bool {
        self.links.insert(link.to_string())
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Serialize the full set back to durable storage.
    ///
    /// Links are written in sorted order so consecutive snapshots diff
    /// cleanly.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), count = self.links.len()))]
    pub async fn persist(&self) -> io::Result<()> {
        let mut sorted: Vec<&String> = self.links.iter().collect();
        sorted.sort();
        let json = serde_json::to_string_pretty(&sorted)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        info!("Persisted dedup ledger");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("newswatch_ledger_{name}.json"))
    }

    #[tokio::test]
    async fn round_trip_preserves_the_set() {
        let path = temp_path("roundtrip");
        let _ = fs::remove_file(&path).await;

        let mut ledger = Ledger::load(&path).await;
        assert!(ledger.is_empty());
        for i in 0..5 {
            assert!(ledger.insert(&format!("https://example.com/{i}")));
        }
        ledger.persist().await.unwrap();

        let reloaded = Ledger::load(&path).await;
        assert_eq!(reloaded.len(), 5);
        for i in 0..5 {
            assert!(reloaded.contains(&format!("https://example.com/{i}")));
        }
        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn corrupt_snapshot_loads_as_empty() {
        let path = temp_path("corrupt");
        fs::write(&path, "{not json at all").await.unwrap();
        let ledger = Ledger::load(&path).await;
        assert!(ledger.is_empty());
        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn missing_snapshot_loads_as_empty() {
        let path = temp_path("missing");
        let _ = fs::remove_file(&path).await;
        let ledger = Ledger::load(&path).await;
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn insert_reports_novelty() {
        let mut ledger = Ledger::empty(temp_path("novelty"));
        assert!(ledger.insert("https://example.com/a"));
        assert!(!ledger.insert("https://example.com/a"));
        assert_eq!(ledger.len(), 1);
    }
}
