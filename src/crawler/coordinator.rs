//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Creating output locations
//! - Restoring the frontier and results from the last checkpoint
//! - Drawing bounded batches and processing them concurrently
//! - Periodic checkpointing and the page budget
//! - Releasing the renderer and writing the final checkpoint

use crate::config::{validate, CrawlConfig};
use crate::crawler::frontier::Frontier;
use crate::crawler::pipeline::{CrawlResults, PageOutcome, PagePipeline};
use crate::crawler::renderer::{build_http_client, HttpRenderer, Renderer};
use crate::documents::{DocumentSink, HttpTransfer, Transfer};
use crate::output::CrawlSummary;
use crate::state::CrawlPhase;
use crate::storage::{CheckpointStore, JsonCheckpointStore};
use crate::HarvestError;
use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A checkpoint is written after any batch that leaves the page count at a
/// multiple of this value
pub const CHECKPOINT_INTERVAL: usize = 10;

/// Stops a running crawl at the next batch boundary
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle {
    flag: Arc<AtomicBool>,
}

impl InterruptHandle {
    /// Requests that the crawl stop after the current batch
    ///
    /// Returns true if an interrupt had already been requested, which
    /// callers treat as a request to stop immediately.
    pub fn interrupt(&self) -> bool {
        self.flag.swap(true, Ordering::SeqCst)
    }

    /// Returns true once an interrupt was requested
    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Per-run tallies that are not derivable from the page set
#[derive(Debug, Default)]
struct RunTally {
    pages_at_start: usize,
    failed: usize,
    batches: usize,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<CrawlConfig>,
    frontier: Arc<Frontier>,
    results: CrawlResults,
    pipeline: Arc<PagePipeline>,
    renderer: Arc<dyn Renderer>,
    store: Arc<dyn CheckpointStore>,
    phase: CrawlPhase,
    interrupt: InterruptHandle,
    fresh: bool,
    tally: RunTally,
}

impl Coordinator {
    /// Creates a coordinator from its collaborators
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - The configuration is invalid, e.g. the start
    ///   URL has no usable base domain or the concurrency limit is zero
    pub fn new(
        config: CrawlConfig,
        renderer: Arc<dyn Renderer>,
        transfer: Arc<dyn Transfer>,
        store: Arc<dyn CheckpointStore>,
    ) -> Result<Self, HarvestError> {
        validate(&config)?;
        let base_domain = config.base_domain()?;
        let config = Arc::new(config);
        let frontier = Arc::new(Frontier::new(base_domain));
        let results = CrawlResults::new();
        let sink = DocumentSink::new(config.documents_dir(), transfer);

        let pipeline = Arc::new(PagePipeline::new(
            Arc::clone(&config),
            Arc::clone(&frontier),
            Arc::clone(&renderer),
            sink,
            results.clone(),
        ));

        Ok(Self {
            config,
            frontier,
            results,
            pipeline,
            renderer,
            store,
            phase: CrawlPhase::Init,
            interrupt: InterruptHandle::default(),
            fresh: false,
            tally: RunTally::default(),
        })
    }

    /// Creates a coordinator using the HTTP renderer, HTTP transfer, and
    /// JSON checkpoint files in the configured output directory
    pub fn from_config(config: CrawlConfig) -> Result<Self, HarvestError> {
        let client = build_http_client()?;
        let store = JsonCheckpointStore::new(&config.output_dir).with_fingerprint(config.fingerprint());

        Self::new(
            config,
            Arc::new(HttpRenderer::new(client.clone())),
            Arc::new(HttpTransfer::new(client)),
            Arc::new(store),
        )
    }

    /// Discards any previous checkpoint instead of resuming from it
    pub fn with_fresh(mut self, fresh: bool) -> Self {
        self.fresh = fresh;
        self
    }

    /// Handle that stops the crawl at the next batch boundary
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// The frontier driving this crawl
    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Pages recorded so far, including restored ones
    pub fn results(&self) -> &CrawlResults {
        &self.results
    }

    fn transition(&mut self, next: CrawlPhase) -> Result<(), HarvestError> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Crawl phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Runs the crawl to completion
    ///
    /// The renderer is released and the final checkpoint written on every
    /// path out of the loop: budget reached, frontier exhausted, or
    /// interrupted. Only failing to create the output directories aborts
    /// the run.
    pub async fn run(&mut self) -> Result<CrawlSummary, HarvestError> {
        let started = Instant::now();

        if let Err(e) = self.init().await {
            self.release_renderer().await;
            return Err(e);
        }

        self.transition(CrawlPhase::Loading)?;
        self.load();

        self.transition(CrawlPhase::Running)?;
        self.run_batches().await;
        tracing::debug!("Crawl loop ran {} batches", self.tally.batches);

        self.transition(CrawlPhase::Draining)?;
        self.release_renderer().await;

        self.transition(CrawlPhase::Done)?;
        self.save_checkpoint();

        let summary = self.summary(started);
        summary.log();
        Ok(summary)
    }

    /// Creates the output directory and its `documents/` subdirectory
    async fn init(&mut self) -> Result<(), HarvestError> {
        for dir in [self.config.output_dir.clone(), self.config.documents_dir()] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|source| HarvestError::OutputDir {
                    path: dir.display().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Seeds the frontier and results from the checkpoint, or from the start URL
    fn load(&mut self) {
        if self.fresh {
            tracing::info!("Starting fresh crawl (ignoring previous state)");
            if let Err(e) = self.store.clear() {
                tracing::warn!("Could not remove previous checkpoint: {}", e);
            }
            self.frontier.reset();
            self.results.clear();
        } else {
            let snapshot = self.store.load();
            for url in snapshot.visited_urls() {
                self.frontier.mark_visited(url);
            }
            for url in &snapshot.pending_urls {
                self.frontier.seed(url);
            }
            self.results.extend(snapshot.pages);
        }

        if self.frontier.pending_len() == 0 && self.frontier.visited_len() == 0 {
            self.frontier.seed(&self.config.start_url);
        }

        self.tally.pages_at_start = self.results.len();
        tracing::info!(
            "Resuming with {} pages done, {} URLs to visit",
            self.tally.pages_at_start,
            self.frontier.pending_len()
        );
    }

    /// Main loop: one bounded batch at a time until a stop condition holds
    async fn run_batches(&mut self) {
        let mut page_count = self.results.len();

        loop {
            if self.interrupt.is_interrupted() {
                tracing::info!("Interrupted, stopping after {} pages", page_count);
                break;
            }

            let pending = self.frontier.pending_len();
            if pending == 0 {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            }

            if page_count >= self.config.max_pages {
                tracing::info!("Page budget of {} reached", self.config.max_pages);
                break;
            }

            let batch_size = self
                .config
                .max_concurrent
                .min(pending)
                .min(self.config.max_pages - page_count);
            let batch = self.frontier.take_batch(batch_size);

            self.dispatch(batch).await;
            self.tally.batches += 1;
            page_count = self.results.len();

            if page_count % CHECKPOINT_INTERVAL == 0 {
                self.save_checkpoint();
                tracing::info!("Progress saved: {} pages scraped", page_count);
            }
        }
    }

    /// Processes one batch concurrently and waits for every unit
    async fn dispatch(&mut self, batch: Vec<String>) {
        let handles: Vec<_> = batch
            .into_iter()
            .map(|url| {
                let pipeline = Arc::clone(&self.pipeline);
                tokio::spawn(async move {
                    let outcome = pipeline.process(&url).await;
                    (url, outcome)
                })
            })
            .collect();

        for joined in join_all(handles).await {
            match joined {
                Ok((_, PageOutcome::Failed(_))) => self.tally.failed += 1,
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("Page task aborted: {}", e);
                    self.tally.failed += 1;
                }
            }
        }
    }

    /// Writes the current pages and pending queue; failures are logged only
    fn save_checkpoint(&self) {
        let pages = self.results.snapshot();
        let pending = self.frontier.pending_snapshot();

        match self.store.save(&pages, &pending) {
            Ok(()) => tracing::info!(
                "Crawler state saved: {} pages, {} URLs to visit",
                pages.len(),
                pending.len()
            ),
            Err(e) => tracing::error!("Error saving crawler state: {}", e),
        }
    }

    async fn release_renderer(&self) {
        if let Err(e) = self.renderer.shutdown().await {
            tracing::warn!("Error releasing renderer: {}", e);
        }
    }

    fn summary(&self, started: Instant) -> CrawlSummary {
        let pages = self.results.snapshot();
        let mut summary = CrawlSummary::from_pages(&pages);
        summary.pages_this_run = pages.len().saturating_sub(self.tally.pages_at_start);
        summary.pages_failed = self.tally.failed;
        summary.pending_remaining = self.frontier.pending_len();
        summary.results_path = self.config.output_dir.join(crate::storage::RESULTS_FILE);
        summary.elapsed = started.elapsed();
        summary
    }
}

/// Runs a crawl with the default HTTP collaborators
///
/// # Example
///
/// ```no_run
/// use site_harvest::config::CrawlConfig;
/// use site_harvest::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = run_crawl(CrawlConfig::new("https://example.com/"), false).await?;
/// println!("{} pages", summary.pages_scraped);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: CrawlConfig, fresh: bool) -> Result<CrawlSummary, HarvestError> {
    let mut coordinator = Coordinator::from_config(config)?.with_fresh(fresh);
    coordinator.run().await
}
