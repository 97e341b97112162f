//! URL handling module for Site-Harvest
//!
//! This module provides domain extraction and the base-domain scoping
//! predicate that decides which discovered links may enter the frontier.

mod domain;

pub use domain::{base_domain_of, extract_domain, is_same_or_subdomain};

use url::Url;

/// Returns true if `url` may be crawled under `base_domain`
///
/// A URL is in scope when it parses with a scheme and a host, and that host
/// equals the base domain or is a subdomain of it. This is the only
/// admission filter besides the frontier's own membership checks.
///
/// # Examples
///
/// ```
/// use site_harvest::url::is_in_scope;
///
/// assert!(is_in_scope("http://sub.example.com/x", "example.com"));
/// assert!(!is_in_scope("http://evil-example.com/x", "example.com"));
/// ```
pub fn is_in_scope(url: &str, base_domain: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return false,
    };

    match extract_domain(&parsed) {
        Some(host) if !host.is_empty() => is_same_or_subdomain(&host, base_domain),
        _ => false,
    }
}

/// Returns the last `/`-separated segment of a URL string
///
/// Query strings are kept, matching how the segment is later sanitized
/// into a filename.
pub fn last_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or("")
}
