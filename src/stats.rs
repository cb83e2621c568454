//! Persisted usage counters and the storage collaborator behind them.
//!
//! ## Storage format
//!
//! [`FileStatsStore`] keeps a small JSON key-value document and stores the
//! counters under a single fixed key:
//!
//! ```json
//! { "sweetTextStats": { "pdfsProcessed": 0, "aiGenerations": 0, "completed": 3 } }
//! ```
//!
//! Other keys in the document are preserved on save. Loading never fails:
//! a missing file, unreadable JSON or a wrongly typed value all yield zeroed
//! counters (the last two with a warning).

use crate::error::SweetTextError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Key the counters live under in the storage document.
pub const STATS_STORAGE_KEY: &str = "sweetTextStats";

/// Process-wide counters, durable across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    pub pdfs_processed: u64,
    pub ai_generations: u64,
    pub completed: u64,
}

/// Amounts to add to each counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsIncrement {
    pub pdfs_processed: u64,
    pub ai_generations: u64,
    pub completed: u64,
}

impl StatsIncrement {
    /// The increment a download applies.
    pub fn completed(n: u64) -> Self {
        Self {
            completed: n,
            ..Self::default()
        }
    }
}

impl Stats {
    pub fn apply(&mut self, inc: StatsIncrement) {
        self.pdfs_processed = self.pdfs_processed.saturating_add(inc.pdfs_processed);
        self.ai_generations = self.ai_generations.saturating_add(inc.ai_generations);
        self.completed = self.completed.saturating_add(inc.completed);
    }

    /// Counters in display order.
    pub fn as_array(&self) -> [u64; 3] {
        [self.pdfs_processed, self.ai_generations, self.completed]
    }
}

/// Key-value persistence for [`Stats`].
pub trait StatsStore: Send + Sync {
    /// Current counters, zeroed if absent or corrupt.
    fn load(&self) -> Stats;

    fn save(&self, stats: &Stats) -> Result<(), SweetTextError>;

    /// Load, apply `inc`, save, and return the re-read counters.
    fn increment(&self, inc: StatsIncrement) -> Result<Stats, SweetTextError> {
        let mut stats = self.load();
        stats.apply(inc);
        self.save(&stats)?;
        Ok(self.load())
    }
}

/// In-memory store, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStatsStore {
    inner: Mutex<Option<Stats>>,
}

impl MemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stats(stats: Stats) -> Self {
        Self {
            inner: Mutex::new(Some(stats)),
        }
    }
}

impl StatsStore for MemoryStatsStore {
    fn load(&self) -> Stats {
        self.inner
            .lock()
            .map(|g| (*g).unwrap_or_default())
            .unwrap_or_default()
    }

    fn save(&self, stats: &Stats) -> Result<(), SweetTextError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| SweetTextError::Internal("stats mutex poisoned".into()))?;
        *guard = Some(*stats);
        Ok(())
    }
}

/// JSON-file store.
#[derive(Debug, Clone)]
pub struct FileStatsStore {
    path: PathBuf,
}

impl FileStatsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$XDG_DATA_HOME/sweettext/storage.json`, falling back to
    /// `$HOME/.local/share`, then the working directory.
    pub fn default_path() -> PathBuf {
        let base = std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local").join("share"))
            })
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("sweettext").join("storage.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Map<String, Value> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Map::new(),
            Err(e) => {
                warn!("Could not read stats file {}: {}", self.path.display(), e);
                return Map::new();
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!("Stats file {} is corrupt; ignoring", self.path.display());
                Map::new()
            }
        }
    }

    fn io_err(&self, source: std::io::Error) -> SweetTextError {
        SweetTextError::StatsIo {
            path: self.path.clone(),
            source,
        }
    }
}

impl StatsStore for FileStatsStore {
    fn load(&self) -> Stats {
        let mut doc = self.read_document();
        match doc.remove(STATS_STORAGE_KEY) {
            None => Stats::default(),
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!("Stored stats under '{}' are invalid: {}", STATS_STORAGE_KEY, e);
                Stats::default()
            }),
        }
    }

    /// Atomic write: temp file in the same directory, then rename.
    fn save(&self, stats: &Stats) -> Result<(), SweetTextError> {
        let mut doc = self.read_document();
        let value = serde_json::to_value(stats)
            .map_err(|e| SweetTextError::Internal(format!("stats serialisation: {e}")))?;
        doc.insert(STATS_STORAGE_KEY.to_string(), value);

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.io_err(e))?;

        let body = serde_json::to_vec_pretty(&Value::Object(doc))
            .map_err(|e| SweetTextError::Internal(format!("stats serialisation: {e}")))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| self.io_err(e))?;
        tmp.write_all(&body).map_err(|e| self.io_err(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_err(e.error))?;

        debug!("Saved stats to {}: {:?}", self.path.display(), stats);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_adds_each_field() {
        let mut s = Stats::default();
        s.apply(StatsIncrement {
            pdfs_processed: 1,
            ai_generations: 2,
            completed: 3,
        });
        s.apply(StatsIncrement::completed(1));
        assert_eq!(s.as_array(), [1, 2, 4]);
    }

    #[test]
    fn serialises_camel_case() {
        let json = serde_json::to_string(&Stats {
            pdfs_processed: 1,
            ai_generations: 0,
            completed: 2,
        })
        .unwrap();
        assert_eq!(json, r#"{"pdfsProcessed":1,"aiGenerations":0,"completed":2}"#);
    }

    #[test]
    fn missing_fields_default_to_zero() {
        let s: Stats = serde_json::from_str(r#"{"completed":7}"#).unwrap();
        assert_eq!(s.as_array(), [0, 0, 7]);
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStatsStore::new();
        assert_eq!(store.load(), Stats::default());
        let after = store.increment(StatsIncrement::completed(1)).unwrap();
        assert_eq!(after.completed, 1);
        assert_eq!(store.load().completed, 1);
    }

    #[test]
    fn file_store_missing_file_is_zeroed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStatsStore::new(dir.path().join("nope.json"));
        assert_eq!(store.load(), Stats::default());
    }

    #[test]
    fn file_store_corrupt_file_is_zeroed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(FileStatsStore::new(&path).load(), Stats::default());

        std::fs::write(&path, r#"{"sweetTextStats": "oops"}"#).unwrap();
        assert_eq!(FileStatsStore::new(&path).load(), Stats::default());
    }

    #[test]
    fn file_store_persists_and_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"theme": "pink"}"#).unwrap();

        let store = FileStatsStore::new(&path);
        store.increment(StatsIncrement::completed(2)).unwrap();

        let reopened = FileStatsStore::new(&path);
        assert_eq!(reopened.load().completed, 2);

        let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["theme"], "pink");
        assert_eq!(doc[STATS_STORAGE_KEY]["completed"], 2);
    }
}
