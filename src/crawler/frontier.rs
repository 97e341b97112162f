//! Crawl frontier: the visited set plus the FIFO queue of pending URLs
//!
//! Every read-check-then-insert sequence happens under a single mutex, so
//! two pipeline units discovering the same link in one batch enqueue it
//! only once. The lock is never held across an `.await`.

use crate::url::is_in_scope;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct FrontierInner {
    visited: HashSet<String>,
    pending: VecDeque<String>,
    // Mirrors `pending` for O(1) membership checks.
    queued: HashSet<String>,
}

impl FrontierInner {
    fn is_known(&self, url: &str) -> bool {
        self.visited.contains(url) || self.queued.contains(url)
    }

    fn enqueue(&mut self, url: &str) -> bool {
        if self.is_known(url) {
            return false;
        }
        self.queued.insert(url.to_string());
        self.pending.push_back(url.to_string());
        true
    }
}

/// Shared crawl membership and ordering
///
/// Invariants:
/// - a URL is never in both the visited set and the pending queue
/// - a URL enters the pending queue at most once before it is dequeued
/// - the visited set only grows (until an explicit [`Frontier::reset`])
#[derive(Debug)]
pub struct Frontier {
    base_domain: String,
    inner: Mutex<FrontierInner>,
}

impl Frontier {
    /// Creates an empty frontier scoped to `base_domain`
    pub fn new(base_domain: impl Into<String>) -> Self {
        Self {
            base_domain: base_domain.into(),
            inner: Mutex::new(FrontierInner::default()),
        }
    }

    /// Base domain used to scope discovered links
    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    fn lock(&self) -> MutexGuard<'_, FrontierInner> {
        // A panicking unit cannot leave the sets half-updated: every
        // mutation below completes before the guard is released.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queues `url` unless it is already visited or pending
    ///
    /// Seeds bypass domain scoping; they come from the configuration or a
    /// checkpoint, not from page content.
    pub fn seed(&self, url: &str) -> bool {
        self.lock().enqueue(url)
    }

    /// Removes up to `n` URLs from the front of the queue
    pub fn take_batch(&self, n: usize) -> Vec<String> {
        let mut inner = self.lock();
        let take = n.min(inner.pending.len());
        let batch: Vec<String> = inner.pending.drain(..take).collect();
        for url in &batch {
            inner.queued.remove(url);
        }
        batch
    }

    /// Records `url` as visited; idempotent
    ///
    /// Returns true if the URL was not visited before.
    pub fn mark_visited(&self, url: &str) -> bool {
        let mut inner = self.lock();
        if inner.queued.remove(url) {
            inner.pending.retain(|queued| queued != url);
        }
        inner.visited.insert(url.to_string())
    }

    /// Offers a link found on a page
    ///
    /// The link is admitted only if it is within the base domain and is
    /// neither visited nor pending. Rejection is silent.
    pub fn offer_discovered(&self, url: &str) -> bool {
        if !is_in_scope(url, &self.base_domain) {
            tracing::trace!("Out of scope: {}", url);
            return false;
        }
        self.lock().enqueue(url)
    }

    /// Returns true if `url` has been visited
    pub fn is_visited(&self, url: &str) -> bool {
        self.lock().visited.contains(url)
    }

    /// Returns true if `url` is waiting in the queue
    pub fn is_pending(&self, url: &str) -> bool {
        self.lock().queued.contains(url)
    }

    /// Number of URLs waiting in the queue
    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Number of visited URLs
    pub fn visited_len(&self) -> usize {
        self.lock().visited.len()
    }

    /// Ordered copy of the pending queue, for checkpointing
    pub fn pending_snapshot(&self) -> Vec<String> {
        self.lock().pending.iter().cloned().collect()
    }

    /// Forgets every visited and pending URL (fresh crawl)
    pub fn reset(&self) {
        *self.lock() = FrontierInner::default();
    }
}
