//! Crawl frontier tests against a real HTTP fetcher

use crate::{mount_page, requested_paths};
use greenscan::config::{Config, UserAgentConfig};
use greenscan::crawler::{build_fetcher, CrawlBudget, Frontier, HttpFetcher};
use greenscan::CrawlError;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_fetcher() -> HttpFetcher {
    HttpFetcher::new(&UserAgentConfig::default(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_crawl_measures_every_page() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/about"]).await;
    mount_page(&server, "/about", &[]).await;

    let fetcher = http_fetcher();
    let report = Frontier::new(&fetcher, CrawlBudget::new(10, 2).unwrap())
        .crawl(&format!("{}/", server.uri()))
        .await
        .unwrap();

    let metrics = report.metrics;
    assert_eq!(metrics.pages_scanned, 2);
    assert!(metrics.total_bytes > 100);
    // html, head, title, body, p and one anchor on the seed page
    assert!(metrics.total_dom_nodes >= 10);
    assert_eq!(metrics.visited_url.path(), "/");
    assert!(report.snapshot.is_none());
}

#[tokio::test]
async fn test_page_budget_limits_requests() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/a", "/b", "/c", "/d", "/e"]).await;
    for route in ["/a", "/b", "/c", "/d", "/e"] {
        mount_page(&server, route, &[]).await;
    }

    let fetcher = http_fetcher();
    let report = Frontier::new(&fetcher, CrawlBudget::new(3, 2).unwrap())
        .crawl(&server.uri())
        .await
        .unwrap();

    assert_eq!(report.metrics.pages_scanned, 3);
    assert_eq!(requested_paths(&server).await, vec!["/", "/a", "/b"]);
}

#[tokio::test]
async fn test_pages_beyond_max_depth_never_requested() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/level1"]).await;
    mount_page(&server, "/level1", &["/level2"]).await;
    mount_page(&server, "/level2", &["/level3"]).await;
    mount_page(&server, "/level3", &[]).await;

    let fetcher = http_fetcher();
    let report = Frontier::new(&fetcher, CrawlBudget::new(10, 1).unwrap())
        .crawl(&server.uri())
        .await
        .unwrap();

    assert_eq!(report.metrics.pages_scanned, 2);
    let paths = requested_paths(&server).await;
    assert!(!paths.contains(&"/level2".to_string()));
    assert!(!paths.contains(&"/level3".to_string()));
}

#[tokio::test]
async fn test_fragments_and_cycles_fetched_once() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/docs#intro", "/docs#usage", "/docs", "/"]).await;
    mount_page(&server, "/docs", &["/", "/docs#top"]).await;

    let fetcher = http_fetcher();
    let report = Frontier::new(&fetcher, CrawlBudget::new(10, 3).unwrap())
        .crawl(&server.uri())
        .await
        .unwrap();

    assert_eq!(report.metrics.pages_scanned, 2);
    assert_eq!(requested_paths(&server).await, vec!["/", "/docs"]);
}

#[tokio::test]
async fn test_external_and_binary_links_not_requested() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        &[
            "https://elsewhere.example/page",
            "/report.pdf",
            "/logout",
            "/page?utm_source=mail",
            "/ok",
        ],
    )
    .await;
    mount_page(&server, "/ok", &[]).await;

    let fetcher = http_fetcher();
    let report = Frontier::new(&fetcher, CrawlBudget::new(10, 2).unwrap())
        .crawl(&server.uri())
        .await
        .unwrap();

    assert_eq!(report.metrics.pages_scanned, 2);
    assert_eq!(requested_paths(&server).await, vec!["/", "/ok"]);
}

#[tokio::test]
async fn test_broken_links_do_not_abort_crawl() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/missing", "/broken", "/fine"]).await;
    mount_page(&server, "/fine", &[]).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher = http_fetcher();
    let report = Frontier::new(&fetcher, CrawlBudget::new(10, 2).unwrap())
        .crawl(&server.uri())
        .await
        .unwrap();

    assert_eq!(report.metrics.pages_scanned, 2);
    let visited: Vec<&str> = report
        .metrics
        .pages_visited
        .iter()
        .map(|u| u.path())
        .collect();
    assert_eq!(visited, vec!["/", "/fine"]);
}

#[tokio::test]
async fn test_unreachable_site_is_crawl_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = http_fetcher();
    let err = Frontier::new(&fetcher, CrawlBudget::new(5, 2).unwrap())
        .crawl(&server.uri())
        .await
        .unwrap_err();

    assert!(matches!(err, CrawlError::NoPagesReachable { .. }));
}

#[tokio::test]
async fn test_slow_page_times_out_and_is_skipped() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/slow", "/fast"]).await;
    mount_page(&server, "/fast", &[]).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&UserAgentConfig::default(), Duration::from_secs(1)).unwrap();
    let report = Frontier::new(&fetcher, CrawlBudget::new(10, 2).unwrap())
        .crawl(&server.uri())
        .await
        .unwrap();

    let visited: Vec<&str> = report
        .metrics
        .pages_visited
        .iter()
        .map(|u| u.path())
        .collect();
    assert_eq!(visited, vec!["/", "/fast"]);
}

#[tokio::test]
async fn test_configured_fetcher_crawls_with_http() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &[]).await;

    let config = Config::default();
    let fetcher = build_fetcher(&config).await.unwrap();
    assert_eq!(fetcher.name(), "http");

    let budget = CrawlBudget::from_config(&config.crawler).unwrap();
    let report = Frontier::new(fetcher.as_ref(), budget)
        .crawl(&server.uri())
        .await
        .unwrap();
    assert_eq!(report.metrics.pages_scanned, 1);
}
