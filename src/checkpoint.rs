//! Durable crawl checkpoints for resumable multi-run crawls.
//!
//! One JSON file per source under `<data_dir>/checkpoints/`. A record is
//! written after every completed page, so a crash mid-run loses at most the
//! in-flight page. Writes go through a temp file and an atomic rename, so a
//! crash during the write cannot corrupt previously saved progress.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

/// Crawl progress for one source, persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlCheckpoint {
    pub source_id: String,
    /// Page numbers that have been fully processed.
    pub completed_pages: BTreeSet<u32>,
    /// Listings imported across all runs of this source.
    pub imported_total: u64,
    pub last_run: Option<DateTime<Utc>>,
}

impl CrawlCheckpoint {
    /// Fresh zero-state for a source that has never been crawled.
    pub fn fresh(source_id: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            completed_pages: BTreeSet::new(),
            imported_total: 0,
            last_run: None,
        }
    }

    /// True if the page was completed by an earlier run and must not be
    /// re-fetched.
    pub fn should_skip(&self, page: u32) -> bool {
        self.completed_pages.contains(&page)
    }
}

/// File-backed store for [`CrawlCheckpoint`] records.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join("checkpoints"),
        }
    }

    fn path_for(&self, source_id: &str) -> PathBuf {
        self.dir.join(format!("{source_id}.json"))
    }

    /// Read the persisted checkpoint, or a fresh zero-state if absent.
    pub fn load(&self, source_id: &str) -> anyhow::Result<CrawlCheckpoint> {
        let path = self.path_for(source_id);
        if !path.exists() {
            return Ok(CrawlCheckpoint::fresh(source_id));
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("reading checkpoint {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing checkpoint {}", path.display()))
    }

    /// Persist a checkpoint atomically (write-new-then-replace).
    pub fn save(&self, checkpoint: &CrawlCheckpoint) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let path = self.path_for(&checkpoint.source_id);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(&mut tmp, checkpoint)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&path)
            .with_context(|| format!("replacing checkpoint {}", path.display()))?;
        Ok(())
    }

    /// Remove a source's checkpoint. Returns false if none existed.
    pub fn clear(&self, source_id: &str) -> anyhow::Result<bool> {
        let path = self.path_for(source_id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)
            .with_context(|| format!("removing checkpoint {}", path.display()))?;
        Ok(true)
    }

    /// Source ids that have a persisted checkpoint.
    pub fn list(&self) -> anyhow::Result<Vec<String>> {
        let mut ids = Vec::new();
        if !self.dir.exists() {
            return Ok(ids);
        }
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// The progress tracker a crawl run works against: a loaded checkpoint plus
/// the store that persists every mutation immediately.
#[derive(Debug)]
pub struct ProgressTracker {
    store: CheckpointStore,
    checkpoint: CrawlCheckpoint,
}

impl ProgressTracker {
    /// Load (or initialize) the checkpoint for a source.
    pub fn load(store: CheckpointStore, source_id: &str) -> anyhow::Result<Self> {
        let checkpoint = store.load(source_id)?;
        Ok(Self { store, checkpoint })
    }

    pub fn checkpoint(&self) -> &CrawlCheckpoint {
        &self.checkpoint
    }

    pub fn should_skip(&self, page: u32) -> bool {
        self.checkpoint.should_skip(page)
    }

    /// Record a fully processed page and persist immediately.
    pub fn record_page_complete(&mut self, page: u32, imported: u64) -> anyhow::Result<()> {
        self.checkpoint.completed_pages.insert(page);
        self.checkpoint.imported_total += imported;
        self.checkpoint.last_run = Some(Utc::now());
        self.store.save(&self.checkpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_absent_returns_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let checkpoint = store.load("midwest").unwrap();
        assert_eq!(checkpoint.source_id, "midwest");
        assert!(checkpoint.completed_pages.is_empty());
        assert_eq!(checkpoint.imported_total, 0);
    }

    #[test]
    fn test_round_trip_and_skip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        let mut tracker = ProgressTracker::load(store.clone(), "midwest").unwrap();
        tracker.record_page_complete(1, 12).unwrap();
        tracker.record_page_complete(2, 9).unwrap();

        // A second run sees the persisted state.
        let reloaded = ProgressTracker::load(store, "midwest").unwrap();
        assert!(reloaded.should_skip(1));
        assert!(reloaded.should_skip(2));
        assert!(!reloaded.should_skip(3));
        assert_eq!(reloaded.checkpoint().imported_total, 21);
        assert!(reloaded.checkpoint().last_run.is_some());
    }

    #[test]
    fn test_save_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        let mut checkpoint = CrawlCheckpoint::fresh("western");
        checkpoint.completed_pages.insert(1);
        store.save(&checkpoint).unwrap();
        checkpoint.completed_pages.insert(2);
        store.save(&checkpoint).unwrap();

        // The file is a single atomic unit, not an append log.
        let loaded = store.load("western").unwrap();
        assert_eq!(loaded.completed_pages.len(), 2);
        let raw = std::fs::read_to_string(dir.path().join("checkpoints/western.json")).unwrap();
        assert_eq!(raw.matches("\"source_id\"").count(), 1);
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        assert!(!store.clear("midwest").unwrap());
        store.save(&CrawlCheckpoint::fresh("midwest")).unwrap();
        assert!(store.clear("midwest").unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_sources() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        store.save(&CrawlCheckpoint::fresh("b-source")).unwrap();
        store.save(&CrawlCheckpoint::fresh("a-source")).unwrap();
        assert_eq!(store.list().unwrap(), vec!["a-source", "b-source"]);
    }
}
