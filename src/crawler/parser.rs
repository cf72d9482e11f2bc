//! HTML parsing for link extraction and markup size
//!
//! This module handles parsing fetched page content to extract:
//! - Same-origin links to follow (from `<a>` tags and canonical links)
//! - An approximate DOM size from a linear scan of markup tags

use crate::url::{is_same_origin, resolve_link};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts the crawlable same-origin links from an HTML page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Fragment-only anchors
/// - Links whose resolved origin differs from `origin`
///
/// Relative links are resolved against `base_url` (the page's final URL).
/// The result is deduplicated and in document order.
///
/// # Example
///
/// ```
/// use greenscan::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page">Link</a><a href="https://other.com/">x</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &base_url, &base_url);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://example.com/page");
/// ```
pub fn extract_links(html: &str, base_url: &Url, origin: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let mut push = |href: &str| {
        if let Some(url) = resolve_link(href, base_url) {
            if is_same_origin(&url, origin) && seen.insert(url.as_str().to_string()) {
                links.push(url);
            }
        }
    };

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    links
}

/// Approximates the DOM size by counting markup tags in the raw body
///
/// A single linear pass: every `<...>` with at least one character between
/// the brackets counts once. Closing tags, comments and the doctype are
/// included, so this over-approximates element count on well-formed pages
/// and never parses.
pub fn count_markup_tags(body: &str) -> u64 {
    let bytes = body.as_bytes();
    let mut count = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'<' {
            match bytes[i + 1..].iter().position(|&b| b == b'>') {
                Some(0) => i += 2,
                Some(offset) => {
                    count += 1;
                    i += offset + 2;
                }
                None => break,
            }
        } else {
            i += 1;
        }
    }

    count
}
