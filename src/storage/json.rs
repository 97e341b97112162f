//! JSON-file checkpoint store
//!
//! Two sibling documents live in the output directory: the results document
//! (an ordered array of pages) and the state document (the pending queue
//! plus the fingerprint of the configuration that produced it). Both are
//! pretty-printed UTF-8 and replaced atomically via write-then-rename.

use crate::storage::traits::{CheckpointStore, StorageError, StorageResult};
use crate::storage::{CrawlSnapshot, Page};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name of the results document
pub const RESULTS_FILE: &str = "scraped_data.json";

/// File name of the state document
pub const STATE_FILE: &str = "crawler_state.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateDocument {
    pending_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    config_fingerprint: Option<String>,
}

/// Checkpoint store backed by two JSON documents in a directory
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    dir: PathBuf,
    fingerprint: Option<String>,
}

impl JsonCheckpointStore {
    /// Creates a store rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            fingerprint: None,
        }
    }

    /// Records `fingerprint` in saved state and checks it on load
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    /// Path of the results document
    pub fn results_path(&self) -> PathBuf {
        self.dir.join(RESULTS_FILE)
    }

    /// Path of the state document
    pub fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    fn load_pages(&self) -> Vec<Page> {
        match read_document::<Vec<Page>>(&self.results_path()) {
            Some(pages) => {
                tracing::info!("Loaded {} pages from existing data", pages.len());
                pages
            }
            None => Vec::new(),
        }
    }

    fn load_state(&self) -> StateDocument {
        let Some(state) = read_document::<StateDocument>(&self.state_path()) else {
            return StateDocument::default();
        };

        if let (Some(current), Some(saved)) = (&self.fingerprint, &state.config_fingerprint) {
            if current != saved {
                tracing::warn!(
                    "Checkpoint was written with a different configuration (saved {}, current {}); resuming anyway",
                    short(saved),
                    short(current)
                );
            }
        }

        tracing::info!("Loaded {} URLs to visit from state", state.pending_urls.len());
        state
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn load(&self) -> CrawlSnapshot {
        let pages = self.load_pages();
        let state = self.load_state();
        CrawlSnapshot::new(pages, state.pending_urls)
    }

    fn save(&self, pages: &[Page], pending_urls: &[String]) -> StorageResult<()> {
        let results = serde_json::to_vec_pretty(pages)?;
        write_atomic(&self.results_path(), &results)?;

        let state = StateDocument {
            pending_urls: pending_urls.to_vec(),
            config_fingerprint: self.fingerprint.clone(),
        };
        let state = serde_json::to_vec_pretty(&state)?;
        write_atomic(&self.state_path(), &state)?;

        tracing::debug!(
            "Checkpoint saved: {} pages, {} URLs to visit",
            pages.len(),
            pending_urls.len()
        );
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        for path in [self.results_path(), self.state_path()] {
            match fs::remove_file(&path) {
                Ok(()) => tracing::info!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_error(&path, e)),
            }
        }
        Ok(())
    }
}

/// Reads and parses a JSON document, logging and returning None on any failure
fn read_document<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No checkpoint document at {}", path.display());
            return None;
        }
        Err(e) => {
            tracing::warn!("Error reading {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(doc) => Some(doc),
        Err(e) => {
            tracing::warn!("Ignoring unparsable checkpoint {}: {}", path.display(), e);
            None
        }
    }
}

/// Writes `bytes` to a sibling temp file, syncs it, then renames it over `path`
fn write_atomic(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    let tmp = path.with_extension("json.tmp");

    let mut file = fs::File::create(&tmp).map_err(|e| io_error(&tmp, e))?;
    file.write_all(bytes).map_err(|e| io_error(&tmp, e))?;
    file.sync_all().map_err(|e| io_error(&tmp, e))?;
    drop(file);

    fs::rename(&tmp, path).map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// First 12 characters of a fingerprint, for log lines
///
/// Saved fingerprints come from disk and may hold arbitrary text.
fn short(fingerprint: &str) -> String {
    fingerprint.chars().take(12).collect()
}
