//! Skip-pattern filter
//!
//! Rejects URLs that are never worth fetching during a footprint scan:
//! session-ending endpoints, tracking-parameter variants of pages we would
//! otherwise fetch twice, and binary downloads.

use url::Url;

/// Path fragments that identify logout endpoints
const LOGOUT_MARKERS: &[&str] = &["logout", "log-out", "signout", "sign-out"];

/// Tracking query parameters matched exactly (`utm_*` is matched by prefix)
const TRACKING_PARAMS: &[&str] = &["gclid", "fbclid", "msclkid", "mc_eid"];

/// File extensions that are not HTML pages
const BINARY_EXTENSIONS: &[&str] = &[
    "pdf", "png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "ico", "zip", "gz", "tar", "mp3",
    "mp4", "webm", "woff", "woff2", "exe", "dmg",
];

/// Exclusion rules applied to every candidate URL
#[derive(Debug, Clone)]
pub struct SkipFilter {
    logout_markers: Vec<String>,
    tracking_params: Vec<String>,
    binary_extensions: Vec<String>,
}

impl Default for SkipFilter {
    fn default() -> Self {
        Self {
            logout_markers: LOGOUT_MARKERS.iter().map(|s| s.to_string()).collect(),
            tracking_params: TRACKING_PARAMS.iter().map(|s| s.to_string()).collect(),
            binary_extensions: BINARY_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SkipFilter {
    /// Returns true if the URL must not be fetched
    pub fn should_skip(&self, url: &Url) -> bool {
        let path = url.path().to_ascii_lowercase();

        self.is_logout(&path) || self.has_tracking_params(url) || self.is_binary(&path)
    }

    fn is_logout(&self, path: &str) -> bool {
        self.logout_markers.iter().any(|m| path.contains(m.as_str()))
    }

    fn has_tracking_params(&self, url: &Url) -> bool {
        url.query_pairs().any(|(key, _)| {
            key.starts_with("utm_") || self.tracking_params.iter().any(|p| p.as_str() == &*key)
        })
    }

    fn is_binary(&self, path: &str) -> bool {
        let last_segment = path.rsplit('/').next().unwrap_or_default();
        match last_segment.rsplit_once('.') {
            Some((_, ext)) => self.binary_extensions.iter().any(|e| e == ext),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skip(url: &str) -> bool {
        SkipFilter::default().should_skip(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_regular_pages_pass() {
        assert!(!skip("https://example.com/"));
        assert!(!skip("https://example.com/about"));
        assert!(!skip("https://example.com/blog/post.html"));
        assert!(!skip("https://example.com/search?q=carbon"));
    }

    #[test]
    fn test_logout_endpoints_skipped() {
        assert!(skip("https://example.com/logout"));
        assert!(skip("https://example.com/account/Sign-Out"));
        assert!(skip("https://example.com/auth/signout?next=/"));
        assert!(skip("https://example.com/log-out"));
    }

    #[test]
    fn test_tracking_params_skipped() {
        assert!(skip("https://example.com/page?utm_source=newsletter"));
        assert!(skip("https://example.com/page?utm_custom=x"));
        assert!(skip("https://example.com/page?id=4&gclid=abc"));
        assert!(skip("https://example.com/page?fbclid=abc"));
    }

    #[test]
    fn test_binary_extensions_skipped() {
        assert!(skip("https://example.com/report.pdf"));
        assert!(skip("https://example.com/img/logo.PNG"));
        assert!(skip("https://example.com/archive.zip"));
        assert!(skip("https://example.com/photo.jpeg"));
    }

    #[test]
    fn test_dotted_directory_is_not_binary() {
        assert!(!skip("https://example.com/v1.png/index"));
    }
}
