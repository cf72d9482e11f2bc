//! Integration tests for GreenScan
//!
//! These tests use wiremock to stand up small websites and drive full scans
//! through the public API.

mod crawl_tests;
mod scan_tests;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts an HTML page at `route` whose body links to each of `links`
pub async fn mount_page(server: &MockServer, route: &str, links: &[&str]) {
    let anchors: String = links
        .iter()
        .map(|href| format!("<a href=\"{}\">link</a>", href))
        .collect();
    let body = format!(
        "<html><head><title>{}</title></head><body><p>content</p>{}</body></html>",
        route, anchors
    );

    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Paths the server was asked for, in request order
pub async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}
