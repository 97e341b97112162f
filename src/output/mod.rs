//! Output module for crawl summaries
//!
//! This module handles reporting the counts a finished crawl emits:
//! pages scraped, documents found and downloaded, and URLs left to resume.

pub mod stats;

pub use stats::{print_summary, CrawlSummary};
