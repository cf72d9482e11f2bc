use crate::UrlError;
use url::Url;

/// Normalizes a URL into the form used as a visited-set key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only `http` and `https` schemes
/// 3. Require a host
/// 4. Remove the fragment (everything after `#`)
///
/// Host lowercasing, dot-segment removal and the empty-path-to-`/` rewrite are
/// already performed by the WHATWG parser. Query strings are kept as-is: pages
/// that differ by tracking parameters are skip-listed by [`super::SkipFilter`]
/// rather than collapsed here.
///
/// # Examples
///
/// ```
/// use greenscan::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com/a/../b#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/b");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

/// Same as [`normalize_url`] for an already parsed URL
pub fn normalize_parsed(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    Ok(url)
}

/// Resolves `href` against `base` and normalizes the result
///
/// Returns `None` for links that can never be crawled: empty hrefs,
/// fragment-only anchors, `javascript:`, `mailto:`, `tel:` and `data:` URIs,
/// and anything that fails to resolve to an HTTP(S) URL.
pub fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    base.join(href).ok().and_then(|url| normalize_parsed(url).ok())
}
