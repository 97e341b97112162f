//! HTML parser for extracting text, links, and document links
//!
//! This module turns rendered HTML into:
//! - Plain page text (scripts and styles removed, whitespace collapsed)
//! - Outbound links to offer to the frontier
//! - Document-link candidates to hand to the document sink

use crate::url::last_segment;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose text never contributes to page text
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// A link classified as a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLink {
    /// Anchor text, or the URL's last segment when the anchor is empty
    pub title: String,

    /// Absolute document URL
    pub url: String,
}

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Visible text of the page
    pub text: String,

    /// Absolute http(s) URLs of non-document links, in document order
    pub links: Vec<String>,

    /// Links whose URL contains one of the configured extensions
    pub documents: Vec<DocumentLink>,
}

/// Parses rendered HTML into text, outbound links, and document links
///
/// # Link Rules
///
/// - Only `<a href>` is considered; hrefs are resolved against `base_url`
/// - `javascript:`, `mailto:`, `tel:`, `data:` and fragment-only hrefs are skipped
/// - A link is a document when its lowercase URL *contains* one of
///   `doc_extensions` anywhere, so `/x.pdf?dl=1` and `/x.pdf/view` both match
/// - Document links are not returned as outbound links
///
/// # Example
///
/// ```
/// use site_harvest::crawler::parse_page;
/// use url::Url;
///
/// let html = r#"<html><body><p>Hello</p><a href="/a">A</a><a href="/r.pdf">Report</a></body></html>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_page(html, &base, &[".pdf".to_string()]);
/// assert_eq!(parsed.links, vec!["https://example.com/a".to_string()]);
/// assert_eq!(parsed.documents[0].title, "Report");
/// ```
pub fn parse_page(html: &str, base_url: &Url, doc_extensions: &[String]) -> ParsedPage {
    let document = Html::parse_document(html);
    let text = extract_text(&document);

    let mut links = Vec::new();
    let mut documents = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(absolute) = resolve_link(href, base_url) else {
                continue;
            };

            // Documents go to the sink only. They are deliberately kept out
            // of `links`, so the frontier never queues them as pages.
            if is_document_url(&absolute, doc_extensions) {
                documents.push(DocumentLink {
                    title: anchor_title(&element, &absolute),
                    url: absolute,
                });
            } else {
                links.push(absolute);
            }
        }
    }

    ParsedPage {
        text,
        links,
        documents,
    }
}

/// Returns true if `url` contains any of `extensions`, case-insensitively
///
/// This is a substring test, not a suffix test.
pub fn is_document_url(url: &str, extensions: &[String]) -> bool {
    let lower = url.to_lowercase();
    extensions
        .iter()
        .any(|ext| !ext.is_empty() && lower.contains(&ext.to_lowercase()))
}

/// Collects visible text, skipping script-like elements
fn extract_text(document: &Html) -> String {
    let mut words: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |e| SKIPPED_ELEMENTS.contains(&e.name()))
        });
        if hidden {
            continue;
        }

        words.extend(text.split_whitespace());
    }

    words.join(" ")
}

fn anchor_title(element: &ElementRef, url: &str) -> String {
    let title = element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ");
    if title.is_empty() {
        last_segment(url).to_string()
    } else {
        title
    }
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
