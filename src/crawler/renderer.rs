//! Page rendering collaborator
//!
//! The orchestrator only needs "URL in, HTML out". Implementations may be
//! a plain HTTP fetch or a browser session; [`Renderer::shutdown`] releases
//! whatever they hold and is always called once the crawl loop ends.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Timeout for a single page request
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors reported by a renderer
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Renderer shutdown failed: {0}")]
    Shutdown(String),
}

/// Produces the rendered HTML of a URL
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Navigates to `url`, waits `wait`, and returns the page HTML
    async fn render(&self, url: &str, wait: Duration) -> Result<String, RenderError>;

    /// Releases renderer resources; called exactly once per run
    async fn shutdown(&self) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Builds the HTTP client shared by the default renderer and transfer
///
/// # Example
///
/// ```no_run
/// use site_harvest::crawler::build_http_client;
///
/// let client = build_http_client().unwrap();
/// ```
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let user_agent = format!("site-harvest/{}", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(PAGE_TIMEOUT)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Renderer that fetches raw HTML over HTTP
///
/// It does not execute scripts; the configured wait is still honored after
/// the response arrives so pacing matches a browser-backed renderer.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, url: &str, wait: Duration) -> Result<String, RenderError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                RenderError::Timeout {
                    url: url.to_string(),
                }
            } else {
                RenderError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| RenderError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        Ok(body)
    }
}
