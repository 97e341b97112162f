//! State module for tracking crawl progress
//!
//! - `CrawlPhase`: the orchestrator's lifecycle (init, loading, running,
//!   draining, done)

mod crawl_phase;

pub use crawl_phase::CrawlPhase;
