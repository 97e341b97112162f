//! Checkpoint store trait and error types

use crate::storage::{CrawlSnapshot, Page};
use thiserror::Error;

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for checkpoint backends
///
/// Implementations persist the completed pages and the pending queue so a
/// later run can resume. Loading never fails: anything missing or corrupt
/// is reported and treated as empty.
pub trait CheckpointStore: Send + Sync {
    /// Restores the last saved snapshot, or an empty one
    fn load(&self) -> CrawlSnapshot;

    /// Persists the given pages and pending URLs
    ///
    /// A failed save must leave the previously saved snapshot intact.
    fn save(&self, pages: &[Page], pending_urls: &[String]) -> StorageResult<()>;

    /// Removes any saved snapshot (used for fresh crawls)
    fn clear(&self) -> StorageResult<()>;
}
