//! Configuration module for Site-Harvest
//!
//! This module builds the immutable [`CrawlConfig`] for a run by merging
//! command-line values, an optional TOML configuration file, and built-in
//! defaults, then validating the result.
//!
//! # Example
//!
//! ```no_run
//! use site_harvest::config::{load_optional_config, resolve_config, CliOverrides};
//!
//! let file = load_optional_config(None);
//! let config = resolve_config("https://example.com/", &CliOverrides::default(), &file).unwrap();
//! println!("Crawl budget: {} pages", config.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    parse_extensions, CliOverrides, CrawlConfig, ExtensionList, FileConfig,
    DEFAULT_DOC_EXTENSIONS, DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_PAGES, DEFAULT_OUTPUT_DIR,
    DEFAULT_WAIT_TIME_SECS,
};

// Re-export parser functions
pub use parser::{
    compute_config_fingerprint, find_config_file, load_config, load_optional_config,
    resolve_config, CONFIG_FILE_NAME,
};
pub use validation::validate;
