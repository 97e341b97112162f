//! Integration tests for the crawler
//!
//! Most tests drive the coordinator against an in-memory site graph; the
//! last ones use wiremock to run the full HTTP stack end-to-end.

use async_trait::async_trait;
use site_harvest::config::CrawlConfig;
use site_harvest::crawler::{Coordinator, RenderError, Renderer};
use site_harvest::documents::{Transfer, TransferBody, TransferError};
use site_harvest::storage::{CheckpointStore, JsonCheckpointStore, RESULTS_FILE, STATE_FILE};
use site_harvest::CrawlPhase;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves canned HTML per URL; unknown URLs time out
struct SiteRenderer {
    pages: HashMap<String, String>,
    renders: AtomicUsize,
    shutdowns: AtomicUsize,
}

impl SiteRenderer {
    fn new(pages: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            pages: pages
                .iter()
                .map(|(u, h)| (u.to_string(), h.to_string()))
                .collect(),
            renders: AtomicUsize::new(0),
            shutdowns: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Renderer for SiteRenderer {
    async fn render(&self, url: &str, _wait: Duration) -> Result<String, RenderError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        self.pages.get(url).cloned().ok_or_else(|| RenderError::Timeout {
            url: url.to_string(),
        })
    }

    async fn shutdown(&self) -> Result<(), RenderError> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Every document transfer fails with a server error
struct BrokenTransfer;

#[async_trait]
impl Transfer for BrokenTransfer {
    async fn open(&self, url: &str) -> Result<Box<dyn TransferBody>, TransferError> {
        Err(TransferError::Status {
            url: url.to_string(),
            status: 500,
        })
    }
}

/// `/` links to `/a`, `/b`, `/c`; each of those links back to `/`
fn star_site() -> Arc<SiteRenderer> {
    SiteRenderer::new(&[
        (
            "http://site.test/",
            r#"<html><body><h1>Home</h1>
               <a href="/a">A</a><a href="/b">B</a><a href="/c">C</a>
               <a href="http://elsewhere.test/">Elsewhere</a>
               </body></html>"#,
        ),
        ("http://site.test/a", r#"<p>Page A</p><a href="/">home</a>"#),
        ("http://site.test/b", r#"<p>Page B</p><a href="/">home</a>"#),
        ("http://site.test/c", r#"<p>Page C</p><a href="/">home</a>"#),
    ])
}

fn test_config(output_dir: &Path, max_pages: usize, max_concurrent: usize) -> CrawlConfig {
    let mut config = CrawlConfig::new("http://site.test/");
    config.output_dir = output_dir.to_path_buf();
    config.max_pages = max_pages;
    config.max_concurrent = max_concurrent;
    config.wait_time = Duration::ZERO;
    config
}

fn coordinator(
    output_dir: &Path,
    max_pages: usize,
    max_concurrent: usize,
    renderer: Arc<SiteRenderer>,
) -> Coordinator {
    let config = test_config(output_dir, max_pages, max_concurrent);
    let store = Arc::new(JsonCheckpointStore::new(output_dir));
    Coordinator::new(config, renderer, Arc::new(BrokenTransfer), store)
        .expect("Failed to create coordinator")
}

fn page_urls(output_dir: &Path) -> Vec<String> {
    JsonCheckpointStore::new(output_dir)
        .load()
        .pages
        .into_iter()
        .map(|p| p.url)
        .collect()
}

#[tokio::test]
async fn test_budget_stops_crawl_with_pending_remainder() {
    let dir = TempDir::new().unwrap();
    let renderer = star_site();
    let mut c = coordinator(dir.path(), 3, 2, renderer.clone());

    let summary = c.run().await.expect("Crawl failed");

    assert_eq!(summary.pages_scraped, 3);
    assert_eq!(summary.pages_this_run, 3);
    assert_eq!(c.phase(), CrawlPhase::Done);
    assert_eq!(renderer.shutdowns.load(Ordering::SeqCst), 1);

    // First batch is `/`, second batch is the first two discoveries.
    let pages = c.results().snapshot();
    assert_eq!(pages[0].url, "http://site.test/");
    let mut rest: Vec<&str> = pages[1..].iter().map(|p| p.url.as_str()).collect();
    rest.sort();
    assert_eq!(rest, vec!["http://site.test/a", "http://site.test/b"]);

    assert_eq!(c.frontier().pending_snapshot(), vec!["http://site.test/c".to_string()]);

    let snapshot = JsonCheckpointStore::new(dir.path()).load();
    assert_eq!(snapshot.pages.len(), 3);
    assert_eq!(snapshot.pending_urls, vec!["http://site.test/c".to_string()]);
}

#[tokio::test]
async fn test_out_of_scope_links_are_never_rendered() {
    let dir = TempDir::new().unwrap();
    let renderer = star_site();
    let mut c = coordinator(dir.path(), 100, 2, renderer.clone());

    let summary = c.run().await.expect("Crawl failed");

    assert_eq!(summary.pages_scraped, 4);
    assert_eq!(summary.pending_remaining, 0);
    assert_eq!(renderer.renders.load(Ordering::SeqCst), 4);
    assert!(!page_urls(dir.path()).iter().any(|u| u.contains("elsewhere")));
}

#[tokio::test]
async fn test_failed_document_keeps_page_and_continues() {
    let dir = TempDir::new().unwrap();
    let renderer = SiteRenderer::new(&[
        (
            "http://site.test/",
            r#"<a href="/files/report.pdf">Annual report</a><a href="/next">Next</a>"#,
        ),
        ("http://site.test/next", "<p>Next page</p>"),
    ]);
    let mut c = coordinator(dir.path(), 10, 2, renderer);

    let summary = c.run().await.expect("Crawl failed");

    assert_eq!(summary.pages_scraped, 2);
    assert_eq!(summary.documents_found, 1);
    assert_eq!(summary.documents_downloaded, 0);

    let pages = JsonCheckpointStore::new(dir.path()).load().pages;
    let home = pages
        .iter()
        .find(|p| p.url == "http://site.test/")
        .expect("home page recorded");
    assert_eq!(home.documents.len(), 1);
    assert_eq!(home.documents[0].title, "Annual report");
    assert_eq!(home.documents[0].source_url, "http://site.test/files/report.pdf");
    assert!(home.documents[0].local_path.is_none());
    assert!(pages.iter().any(|p| p.url == "http://site.test/next"));
}

#[tokio::test]
async fn test_render_failure_is_not_retried() {
    let dir = TempDir::new().unwrap();
    let renderer = SiteRenderer::new(&[(
        "http://site.test/",
        r#"<a href="/gone">Gone</a><a href="/also-gone">Also gone</a>"#,
    )]);
    let mut c = coordinator(dir.path(), 10, 2, renderer.clone());

    let summary = c.run().await.expect("Crawl failed");

    assert_eq!(summary.pages_scraped, 1);
    assert_eq!(summary.pages_failed, 2);
    assert_eq!(summary.pending_remaining, 0);
    assert_eq!(renderer.renders.load(Ordering::SeqCst), 3);
    assert!(c.frontier().is_visited("http://site.test/gone"));
}

#[tokio::test]
async fn test_resume_continues_from_checkpoint() {
    let dir = TempDir::new().unwrap();

    let mut first = coordinator(dir.path(), 3, 2, star_site());
    first.run().await.expect("First crawl failed");

    let renderer = star_site();
    let mut second = coordinator(dir.path(), 10, 2, renderer.clone());
    let summary = second.run().await.expect("Second crawl failed");

    assert_eq!(summary.pages_scraped, 4);
    assert_eq!(summary.pages_this_run, 1);
    // Only `/c` is rendered; `/` is already visited from the checkpoint.
    assert_eq!(renderer.renders.load(Ordering::SeqCst), 1);
    assert_eq!(page_urls(dir.path()).last().map(String::as_str), Some("http://site.test/c"));
}

#[tokio::test]
async fn test_resume_after_completion_is_idempotent() {
    let dir = TempDir::new().unwrap();

    let mut first = coordinator(dir.path(), 100, 3, star_site());
    first.run().await.expect("First crawl failed");
    let before = page_urls(dir.path());

    let renderer = star_site();
    let mut second = coordinator(dir.path(), 100, 3, renderer.clone());
    let summary = second.run().await.expect("Second crawl failed");

    assert_eq!(summary.pages_this_run, 0);
    assert_eq!(summary.pages_scraped, before.len());
    assert_eq!(renderer.renders.load(Ordering::SeqCst), 0);
    assert_eq!(renderer.shutdowns.load(Ordering::SeqCst), 1);
    assert_eq!(page_urls(dir.path()), before);
}

#[tokio::test]
async fn test_fresh_discards_checkpoint() {
    let dir = TempDir::new().unwrap();

    let mut first = coordinator(dir.path(), 100, 2, star_site());
    first.run().await.expect("First crawl failed");

    let renderer = star_site();
    let mut second = coordinator(dir.path(), 100, 2, renderer.clone()).with_fresh(true);
    let summary = second.run().await.expect("Fresh crawl failed");

    assert_eq!(summary.pages_scraped, 4);
    assert_eq!(summary.pages_this_run, 4);
    assert_eq!(renderer.renders.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_checkpoint_round_trip_reseeds_frontier() {
    let dir = TempDir::new().unwrap();
    let mut c = coordinator(dir.path(), 3, 2, star_site());
    c.run().await.expect("Crawl failed");

    let mut resumed = coordinator(dir.path(), 3, 2, star_site());
    let summary = resumed.run().await.expect("Resumed crawl failed");

    // Budget already spent: nothing rendered, state carried over unchanged.
    assert_eq!(summary.pages_this_run, 0);
    for page in c.results().snapshot() {
        assert!(resumed.frontier().is_visited(&page.url));
    }
    assert_eq!(
        resumed.frontier().pending_snapshot(),
        c.frontier().pending_snapshot()
    );
}

#[tokio::test]
async fn test_corrupt_checkpoint_starts_over() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(RESULTS_FILE), "not json").unwrap();
    std::fs::write(dir.path().join(STATE_FILE), "{ \"pending_urls\": ").unwrap();

    let mut c = coordinator(dir.path(), 100, 2, star_site());
    let summary = c.run().await.expect("Crawl failed");

    assert_eq!(summary.pages_scraped, 4);
    assert_eq!(page_urls(dir.path()).len(), 4);
}

#[tokio::test]
async fn test_interrupted_crawl_saves_and_releases() {
    let dir = TempDir::new().unwrap();
    let renderer = star_site();
    let mut c = coordinator(dir.path(), 100, 2, renderer.clone());
    c.interrupt_handle().interrupt();

    let summary = c.run().await.expect("Crawl failed");

    assert_eq!(summary.pages_scraped, 0);
    assert_eq!(renderer.shutdowns.load(Ordering::SeqCst), 1);
    let snapshot = JsonCheckpointStore::new(dir.path()).load();
    assert_eq!(snapshot.pending_urls, vec!["http://site.test/".to_string()]);
}

#[tokio::test]
async fn test_full_crawl_over_http() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><p>Welcome</p>
               <a href="/about">About</a>
               <a href="/files/q3-report.PDF">Report</a>
               <a href="/files/download?id=7&amp;type=.csv">Export</a>
               </body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><p>About us</p><a href="/missing">Missing</a></body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/q3-report.PDF"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4".to_vec()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/download"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"a,b\n1,2\n".to_vec())
                .insert_header("content-disposition", r#"attachment; filename="Q3 figures.csv""#),
        )
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = CrawlConfig::new(format!("{}/", base_url));
    config.output_dir = dir.path().join("out");
    config.wait_time = Duration::ZERO;
    config.max_concurrent = 2;

    let mut c = Coordinator::from_config(config).expect("Failed to create coordinator");
    let summary = c.run().await.expect("Crawl failed");

    assert_eq!(summary.pages_scraped, 2);
    assert_eq!(summary.pages_failed, 1);
    assert_eq!(summary.documents_found, 2);
    assert_eq!(summary.documents_downloaded, 2);

    let documents = dir.path().join("out").join("documents");
    assert_eq!(std::fs::read(documents.join("q3-report.PDF")).unwrap(), b"%PDF-1.4");
    assert_eq!(std::fs::read(documents.join("Q3_figures.csv")).unwrap(), b"a,b\n1,2\n");

    let out = dir.path().join("out");
    assert!(out.join(RESULTS_FILE).exists());
    let state: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join(STATE_FILE)).unwrap()).unwrap();
    assert_eq!(state["pending_urls"], serde_json::json!([]));
}

#[tokio::test]
async fn test_existing_document_is_not_downloaded_again() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<a href="/manual.pdf">Manual</a>"#),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/manual.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fresh".to_vec()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let documents = dir.path().join("documents");
    std::fs::create_dir_all(&documents).unwrap();
    std::fs::write(documents.join("manual.pdf"), b"cached").unwrap();

    let mut config = CrawlConfig::new(format!("{}/", base_url));
    config.output_dir = dir.path().to_path_buf();
    config.wait_time = Duration::ZERO;

    let mut c = Coordinator::from_config(config).expect("Failed to create coordinator");
    let summary = c.run().await.expect("Crawl failed");

    assert_eq!(summary.documents_downloaded, 1);
    assert_eq!(std::fs::read(documents.join("manual.pdf")).unwrap(), b"cached");
}
