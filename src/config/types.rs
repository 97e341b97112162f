use crate::config::parser::compute_config_fingerprint;
use crate::url::base_domain_of;
use crate::UrlResult;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default output directory for results, state, and documents
pub const DEFAULT_OUTPUT_DIR: &str = "gscraper_data";

/// Default page budget
pub const DEFAULT_MAX_PAGES: usize = 1000;

/// Default post-navigation render wait, in seconds
pub const DEFAULT_WAIT_TIME_SECS: f64 = 5.0;

/// Default recognized document extensions
pub const DEFAULT_DOC_EXTENSIONS: &str = "pdf,doc,docx,xls,xlsx,csv";

/// Default number of pages processed concurrently
pub const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Immutable per-run crawl configuration
///
/// Constructed once at startup and shared read-only with every component.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlConfig {
    /// URL the crawl starts from; its host defines the crawl scope
    pub start_url: String,

    /// Directory holding the results document, state document, and `documents/`
    pub output_dir: PathBuf,

    /// Maximum number of pages to record, including pages from earlier runs
    pub max_pages: usize,

    /// Fixed delay applied by the renderer after navigation
    pub wait_time: Duration,

    /// Document extensions, lowercase with a leading dot (e.g. ".pdf")
    pub doc_extensions: Vec<String>,

    /// Maximum number of pages rendered at the same time
    pub max_concurrent: usize,
}

impl CrawlConfig {
    /// Creates a configuration for `start_url` with built-in defaults
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_pages: DEFAULT_MAX_PAGES,
            wait_time: Duration::from_secs_f64(DEFAULT_WAIT_TIME_SECS),
            doc_extensions: parse_extensions(DEFAULT_DOC_EXTENSIONS),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    /// Directory where downloaded documents are stored
    pub fn documents_dir(&self) -> PathBuf {
        self.output_dir.join("documents")
    }

    /// Host of the start URL; links outside it and its subdomains are dropped
    pub fn base_domain(&self) -> UrlResult<String> {
        base_domain_of(&self.start_url)
    }

    /// Fingerprint recorded in checkpoints to flag configuration drift
    pub fn fingerprint(&self) -> String {
        compute_config_fingerprint(self)
    }
}

/// Optional on-disk configuration; every key may be omitted
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct FileConfig {
    pub output_dir: Option<String>,
    pub max_pages: Option<usize>,
    pub wait_time: Option<f64>,
    pub doc_extensions: Option<ExtensionList>,
    pub max_concurrent: Option<usize>,
}

/// Document extensions as written in a config file
///
/// Both `"pdf,docx"` and `["pdf", "docx"]` are accepted.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ExtensionList {
    List(Vec<String>),
    Csv(String),
}

impl ExtensionList {
    /// Normalizes the list into lowercase, dot-prefixed extensions
    pub fn normalized(&self) -> Vec<String> {
        match self {
            Self::List(items) => parse_extensions(&items.join(",")),
            Self::Csv(csv) => parse_extensions(csv),
        }
    }
}

/// Values supplied on the command line; `None` means "not given"
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub output_dir: Option<PathBuf>,
    pub max_pages: Option<usize>,
    pub wait_time: Option<f64>,
    pub doc_extensions: Option<String>,
    pub max_concurrent: Option<usize>,
}

/// Splits a comma-separated extension list into `.ext` entries
///
/// Entries are trimmed and lowercased; a leading dot is added when missing
/// and empty entries are dropped.
pub fn parse_extensions(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
        .collect()
}
