//! Storage module for persisting crawl progress
//!
//! This module handles the checkpoint that makes a crawl resumable:
//! - Page and document records produced by the crawl
//! - The snapshot projection of frontier + completed pages
//! - A JSON-file backed checkpoint store with atomic replacement

mod json;
mod traits;

pub use json::{JsonCheckpointStore, RESULTS_FILE, STATE_FILE};
pub use traits::{CheckpointStore, StorageError, StorageResult};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// A successfully processed page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub text: String,
    pub documents: Vec<DocumentRef>,
    pub scraped_at: DateTime<Utc>,
}

/// A document linked from a page
///
/// `local_path` is `None` when the transfer failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub title: String,
    pub source_url: String,
    pub local_path: Option<PathBuf>,
}

impl DocumentRef {
    /// Returns true if the document was stored locally
    pub fn is_resolved(&self) -> bool {
        self.local_path.is_some()
    }
}

/// Serializable projection of the frontier plus completed pages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlSnapshot {
    pub pages: Vec<Page>,
    pub pending_urls: Vec<String>,
}

impl CrawlSnapshot {
    /// Builds a snapshot, dropping pending URLs that were already visited
    ///
    /// Duplicate pending entries are collapsed, keeping first-seen order.
    pub fn new(pages: Vec<Page>, pending_urls: Vec<String>) -> Self {
        let mut seen: HashSet<String> = pages.iter().map(|p| p.url.clone()).collect();
        let before = pending_urls.len();
        let pending_urls: Vec<String> = pending_urls
            .into_iter()
            .filter(|url| seen.insert(url.clone()))
            .collect();

        if pending_urls.len() != before {
            tracing::warn!(
                "Dropped {} pending URLs that were already visited or duplicated",
                before - pending_urls.len()
            );
        }

        Self {
            pages,
            pending_urls,
        }
    }

    /// Returns true if there is nothing to resume from
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty() && self.pending_urls.is_empty()
    }

    /// URLs of all completed pages
    pub fn visited_urls(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().map(|p| p.url.as_str())
    }
}
