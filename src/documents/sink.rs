//! Document sink: resolves document URLs to deduplicated local files

use crate::documents::transfer::{Transfer, TransferError};
use crate::url::last_segment;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex as AsyncMutex;

/// Fallback name when a URL or hint sanitizes to nothing usable
const FALLBACK_FILENAME: &str = "document";

/// Errors produced while acquiring a document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Replaces every character outside `[A-Za-z0-9._-]` with `_`
///
/// Names that would be empty or consist only of dots become `document`,
/// so the result is always a plain file name inside the target directory.
///
/// # Examples
///
/// ```
/// use site_harvest::documents::sanitize_filename;
///
/// assert_eq!(sanitize_filename("report final (v2).pdf"), "report_final__v2_.pdf");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.chars().all(|c| c == '.') {
        FALLBACK_FILENAME.to_string()
    } else {
        sanitized
    }
}

/// Maps document URLs to local paths under a single directory
///
/// A document whose candidate file already exists is not transferred again.
/// Two distinct URLs sharing a last path segment therefore resolve to the
/// same file. Concurrent acquires of the same candidate are serialized, so
/// only the first one transfers and the rest find the finished file.
#[derive(Clone)]
pub struct DocumentSink {
    dir: PathBuf,
    transfer: Arc<dyn Transfer>,
    in_flight: Arc<Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>>,
    part_seq: Arc<AtomicU64>,
}

impl DocumentSink {
    /// Creates a sink writing into `dir` through `transfer`
    pub fn new(dir: impl Into<PathBuf>, transfer: Arc<dyn Transfer>) -> Self {
        Self {
            dir: dir.into(),
            transfer,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            part_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Candidate local path for `url`, before any server filename hint
    pub fn candidate_path(&self, url: &str) -> PathBuf {
        self.dir.join(sanitize_filename(last_segment(url)))
    }

    /// Resolves `url` to a local file, transferring it if needed
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Existing or newly written file
    /// * `Err(DocumentError)` - Transfer failed or the file could not be written
    pub async fn acquire(&self, url: &str) -> Result<PathBuf, DocumentError> {
        let candidate = self.candidate_path(url);

        let slot = self.slot_for(&candidate);
        let result = {
            let _guard = slot.lock().await;
            self.acquire_locked(url, candidate.clone()).await
        };
        self.release_slot(&candidate, slot);

        result
    }

    async fn acquire_locked(&self, url: &str, candidate: PathBuf) -> Result<PathBuf, DocumentError> {
        if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            tracing::debug!("Document already exists: {}", candidate.display());
            return Ok(candidate);
        }

        let mut body = self.transfer.open(url).await?;

        let final_path = match body.suggested_filename() {
            Some(hint) => self.dir.join(sanitize_filename(&hint)),
            None => candidate,
        };

        // Hints can map different candidates onto one final path, so each
        // transfer streams into its own part file.
        let seq = self.part_seq.fetch_add(1, Ordering::Relaxed);
        let part_path = part_path_for(&final_path, seq);
        let mut file = tokio::fs::File::create(&part_path)
            .await
            .map_err(|e| io_error(&part_path, e))?;

        let streamed: Result<(), DocumentError> = async {
            while let Some(chunk) = body.next_chunk().await? {
                file.write_all(&chunk)
                    .await
                    .map_err(|e| io_error(&part_path, e))?;
            }
            file.flush().await.map_err(|e| io_error(&part_path, e))?;
            Ok(())
        }
        .await;
        drop(file);

        if let Err(e) = streamed {
            let _ = tokio::fs::remove_file(&part_path).await;
            return Err(e);
        }

        if let Err(e) = tokio::fs::rename(&part_path, &final_path).await {
            let _ = tokio::fs::remove_file(&part_path).await;
            if tokio::fs::try_exists(&final_path).await.unwrap_or(false) {
                tracing::debug!("Document written concurrently: {}", final_path.display());
                return Ok(final_path);
            }
            return Err(io_error(&final_path, e));
        }

        tracing::info!("Downloaded {} -> {}", url, final_path.display());
        Ok(final_path)
    }

    fn slot_for(&self, candidate: &Path) -> Arc<AsyncMutex<()>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|p| p.into_inner());
        Arc::clone(in_flight.entry(candidate.to_path_buf()).or_default())
    }

    fn release_slot(&self, candidate: &Path, slot: Arc<AsyncMutex<()>>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|p| p.into_inner());
        drop(slot);
        // Only the map's own reference left: nobody else is waiting.
        if in_flight
            .get(candidate)
            .map_or(false, |entry| Arc::strong_count(entry) == 1)
        {
            in_flight.remove(candidate);
        }
    }
}

fn part_path_for(path: &Path, seq: u64) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{}.part", seq));
    PathBuf::from(name)
}

fn io_error(path: &Path, source: std::io::Error) -> DocumentError {
    DocumentError::Io {
        path: path.display().to_string(),
        source,
    }
}
