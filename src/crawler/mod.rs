//! Crawler module for page rendering and crawl orchestration
//!
//! This module contains the core crawling logic, including:
//! - The frontier of visited and pending URLs
//! - Rendering pages and extracting text, links, and document links
//! - The per-URL page pipeline
//! - Overall crawl coordination and checkpointing

mod coordinator;
mod frontier;
mod parser;
mod pipeline;
mod renderer;

pub use coordinator::{run_crawl, Coordinator, InterruptHandle, CHECKPOINT_INTERVAL};
pub use frontier::Frontier;
pub use parser::{is_document_url, parse_page, DocumentLink, ParsedPage};
pub use pipeline::{CrawlResults, PageOutcome, PagePipeline};
pub use renderer::{build_http_client, HttpRenderer, RenderError, Renderer, PAGE_TIMEOUT};
