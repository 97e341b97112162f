//! End-of-crawl summary
//!
//! Counts are derived from the recorded pages plus the run's own tallies.

use crate::storage::Page;
use std::path::PathBuf;
use std::time::Duration;

/// Summary emitted when a crawl reaches its final phase
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSummary {
    /// Total pages recorded, including pages restored from a checkpoint
    pub pages_scraped: usize,

    /// Pages recorded during this run
    pub pages_this_run: usize,

    /// URLs that failed to render during this run
    pub pages_failed: usize,

    /// Document links recorded across all pages
    pub documents_found: usize,

    /// Documents that resolved to a local file
    pub documents_downloaded: usize,

    /// URLs still waiting in the frontier
    pub pending_remaining: usize,

    /// Path of the results document
    pub results_path: PathBuf,

    /// Wall-clock time spent in this run
    pub elapsed: Duration,
}

impl CrawlSummary {
    /// Builds a summary from the final page set
    pub fn from_pages(pages: &[Page]) -> Self {
        let documents_found = pages.iter().map(|p| p.documents.len()).sum();
        let documents_downloaded = pages
            .iter()
            .flat_map(|p| p.documents.iter())
            .filter(|d| d.is_resolved())
            .count();

        Self {
            pages_scraped: pages.len(),
            pages_this_run: 0,
            pages_failed: 0,
            documents_found,
            documents_downloaded,
            pending_remaining: 0,
            results_path: PathBuf::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Writes the summary to the log
    pub fn log(&self) {
        tracing::info!(
            "Scraping complete. Data saved to {}",
            self.results_path.display()
        );
        tracing::info!(
            "Total pages scraped: {} ({} this run, {} failed)",
            self.pages_scraped,
            self.pages_this_run,
            self.pages_failed
        );
        tracing::info!(
            "Total documents downloaded: {} of {}",
            self.documents_downloaded,
            self.documents_found
        );
        if self.pending_remaining > 0 {
            tracing::info!(
                "{} URLs remain queued; run again to resume",
                self.pending_remaining
            );
        }
    }
}

/// Prints a summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");
    println!("Pages scraped:        {}", summary.pages_scraped);
    println!("  this run:           {}", summary.pages_this_run);
    println!("  failed this run:    {}", summary.pages_failed);
    println!("Documents found:      {}", summary.documents_found);
    println!("Documents downloaded: {}", summary.documents_downloaded);
    println!("URLs still queued:    {}", summary.pending_remaining);
    println!("Elapsed:              {:.1?}", summary.elapsed);
    println!("\nResults: {}", summary.results_path.display());
}
