//! URL handling module for GreenScan
//!
//! This module provides URL normalization for visited-set dedup, link
//! resolution, same-origin checks and the skip-pattern filter.

mod filter;
mod normalize;

// Re-export main functions
pub use filter::SkipFilter;
pub use normalize::{normalize_parsed, normalize_url, resolve_link};

use url::Url;

/// Returns true if both URLs share scheme, host and port
///
/// # Examples
///
/// ```
/// use greenscan::url::is_same_origin;
/// use url::Url;
///
/// let seed = Url::parse("https://example.com/").unwrap();
/// assert!(is_same_origin(&seed, &Url::parse("https://example.com/a").unwrap()));
/// assert!(!is_same_origin(&seed, &Url::parse("http://example.com/a").unwrap()));
/// assert!(!is_same_origin(&seed, &Url::parse("https://cdn.example.com/a").unwrap()));
/// ```
pub fn is_same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}
