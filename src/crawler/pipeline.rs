//! Page pipeline: the per-URL unit of work
//!
//! One run renders a URL, parses it, resolves its documents through the
//! sink, records the page, and feeds discovered links back to the frontier.
//! Failures stay inside the unit; the orchestrator only sees the outcome.

use crate::config::CrawlConfig;
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::parse_page;
use crate::crawler::renderer::Renderer;
use crate::documents::DocumentSink;
use crate::storage::{DocumentRef, Page};
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Semaphore;
use url::Url;

/// Result of processing one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// A page was recorded
    Scraped {
        /// Document links found on the page
        documents: usize,
        /// Documents that resolved to a local file
        resolved: usize,
        /// Discovered links admitted to the frontier
        links_admitted: usize,
    },

    /// The URL was already visited
    Skipped,

    /// Rendering failed; the URL is visited and will not be retried
    Failed(String),
}

/// Completed pages shared by all pipeline units
#[derive(Debug, Clone, Default)]
pub struct CrawlResults {
    pages: Arc<Mutex<Vec<Page>>>,
}

impl CrawlResults {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Page>> {
        self.pages.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends a finished page
    pub fn push(&self, page: Page) {
        self.lock().push(page);
    }

    /// Appends pages restored from a checkpoint
    pub fn extend(&self, pages: Vec<Page>) {
        self.lock().extend(pages);
    }

    /// Number of pages recorded
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of all pages in completion order
    pub fn snapshot(&self) -> Vec<Page> {
        self.lock().clone()
    }

    /// Drops every recorded page (fresh crawl)
    pub fn clear(&self) {
        self.lock().clear();
    }
}

/// Everything a unit of work needs, shared across a batch
pub struct PagePipeline {
    config: Arc<CrawlConfig>,
    frontier: Arc<Frontier>,
    renderer: Arc<dyn Renderer>,
    sink: DocumentSink,
    gate: Arc<Semaphore>,
    results: CrawlResults,
}

impl PagePipeline {
    /// Creates a pipeline; `max_concurrent` render permits are shared by all units
    pub fn new(
        config: Arc<CrawlConfig>,
        frontier: Arc<Frontier>,
        renderer: Arc<dyn Renderer>,
        sink: DocumentSink,
        results: CrawlResults,
    ) -> Self {
        let gate = Arc::new(Semaphore::new(config.max_concurrent));
        Self {
            config,
            frontier,
            renderer,
            sink,
            gate,
            results,
        }
    }

    /// Processes a single URL
    ///
    /// This method:
    /// 1. Skips URLs that are already visited
    /// 2. Renders the page under the shared concurrency gate
    /// 3. Marks the URL visited (also when rendering failed)
    /// 4. Parses text, links, and document links
    /// 5. Resolves every document link through the sink
    /// 6. Records the page
    /// 7. Offers discovered links to the frontier
    pub async fn process(&self, url: &str) -> PageOutcome {
        if self.frontier.is_visited(url) {
            tracing::debug!("Already visited, skipping: {}", url);
            return PageOutcome::Skipped;
        }

        tracing::info!("Scraping: {}", url);

        let html = match self.render(url).await {
            Ok(html) => html,
            Err(reason) => {
                tracing::warn!("Error fetching {}: {}", url, reason);
                self.frontier.mark_visited(url);
                return PageOutcome::Failed(reason);
            }
        };

        self.frontier.mark_visited(url);

        let base_url = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!("Cannot resolve links against {}: {}", url, e);
                return PageOutcome::Failed(format!("invalid URL: {}", e));
            }
        };
        let parsed = parse_page(&html, &base_url, &self.config.doc_extensions);

        let mut documents = Vec::with_capacity(parsed.documents.len());
        for link in parsed.documents {
            let local_path = match self.sink.acquire(&link.url).await {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!("Error downloading {}: {}", link.url, e);
                    None
                }
            };
            documents.push(DocumentRef {
                title: link.title,
                source_url: link.url,
                local_path,
            });
        }

        let document_count = documents.len();
        let resolved = documents.iter().filter(|d| d.is_resolved()).count();

        self.results.push(Page {
            url: url.to_string(),
            text: parsed.text,
            documents,
            scraped_at: Utc::now(),
        });

        let links_admitted = parsed
            .links
            .iter()
            .filter(|link| self.frontier.offer_discovered(link))
            .count();

        tracing::debug!(
            "{}: {} documents ({} stored), {} new links",
            url,
            document_count,
            resolved,
            links_admitted
        );

        PageOutcome::Scraped {
            documents: document_count,
            resolved,
            links_admitted,
        }
    }

    async fn render(&self, url: &str) -> Result<String, String> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| format!("concurrency gate closed: {}", e))?;

        self.renderer
            .render(url, self.config.wait_time)
            .await
            .map_err(|e| e.to_string())
    }
}
