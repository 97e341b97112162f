use crate::UrlError;
use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host, it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_harvest::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Derives the base domain used for scoping from a start URL
///
/// # Returns
///
/// * `Ok(String)` - The lowercase host of the start URL
/// * `Err(UrlError)` - The URL is malformed, not http(s), or has no host
pub fn base_domain_of(start_url: &str) -> Result<String, UrlError> {
    let url = Url::parse(start_url).map_err(|e| UrlError::Parse(format!("{}: {}", start_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    extract_domain(&url).ok_or(UrlError::MissingDomain)
}

/// Returns true if `host` is `base_domain` itself or one of its subdomains
pub fn is_same_or_subdomain(host: &str, base_domain: &str) -> bool {
    let host = host.to_lowercase();
    let base = base_domain.to_lowercase();

    host == base || host.ends_with(&format!(".{}", base))
}
