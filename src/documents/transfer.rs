//! Document transfer collaborator
//!
//! The sink asks a [`Transfer`] to open a document URL; the returned
//! [`TransferBody`] carries the server's filename hint and yields the body
//! in chunks so large documents never sit fully in memory.

use async_trait::async_trait;
use reqwest::{header::CONTENT_DISPOSITION, Client, Response};
use std::time::Duration;
use thiserror::Error;

/// Per-request timeout for document transfers
pub const TRANSFER_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors reported by a transfer collaborator
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Failed to download {url}: status {status}")]
    Status { url: String, status: u16 },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Transfer of {url} failed: {message}")]
    Other { url: String, message: String },
}

/// An open document transfer
#[async_trait]
pub trait TransferBody: Send {
    /// Filename suggested by the server, unsanitized
    fn suggested_filename(&self) -> Option<String>;

    /// Returns the next body chunk, or `None` once the body is exhausted
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransferError>;
}

/// Opens document URLs for streaming
#[async_trait]
pub trait Transfer: Send + Sync {
    /// Starts a transfer; non-success responses are errors
    async fn open(&self, url: &str) -> Result<Box<dyn TransferBody>, TransferError>;
}

/// Transfer over HTTP using `reqwest`
#[derive(Debug, Clone)]
pub struct HttpTransfer {
    client: Client,
}

impl HttpTransfer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

struct HttpBody {
    url: String,
    response: Response,
    suggested: Option<String>,
}

#[async_trait]
impl TransferBody for HttpBody {
    fn suggested_filename(&self) -> Option<String> {
        self.suggested.clone()
    }

    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransferError> {
        self.response
            .chunk()
            .await
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .map_err(|source| TransferError::Http {
                url: self.url.clone(),
                source,
            })
    }
}

#[async_trait]
impl Transfer for HttpTransfer {
    async fn open(&self, url: &str) -> Result<Box<dyn TransferBody>, TransferError> {
        let response = self
            .client
            .get(url)
            .timeout(TRANSFER_TIMEOUT)
            .send()
            .await
            .map_err(|source| TransferError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let suggested = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(content_disposition_filename);

        Ok(Box::new(HttpBody {
            url: url.to_string(),
            response,
            suggested,
        }))
    }
}

/// Extracts the `filename` parameter from a `content-disposition` value
///
/// Quoted and bare values are accepted; the extended `filename*=` form is
/// ignored.
pub fn content_disposition_filename(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|param| {
            let (key, value) = param.split_once('=')?;
            if !key.trim().eq_ignore_ascii_case("filename") {
                return None;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            Some(value.to_string())
        })
        .filter(|name| !name.is_empty())
}
