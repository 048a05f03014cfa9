//! Discovery integration tests against a mock news site
//!
//! Each test mounts a small site on wiremock: feeds at conventional paths,
//! robots.txt sitemap declarations, homepage feed links and sitemap indexes.
//! Paths that are not mounted answer 404, which is how most probes fail.

use newsdesk::config::DiscoveryConfig;
use newsdesk::discovery::{read_url_file, write_url_file, DiscoveryEngine};
use newsdesk::storage::{create_sqlite_repository, ArticleRepository};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::{
    homepage_with_feed_link, rss_feed, sitemap_index, urlset, RELATIVE_ATOM_FEED, SOFT_404_HTML,
};
use crate::common::{article_html, test_fetcher, test_pipeline};

async fn mount(server: &MockServer, at: &str, status: u16, body: String, mime: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(status).set_body_raw(body.into_bytes(), mime))
        .mount(server)
        .await;
}

fn engine(config: DiscoveryConfig) -> DiscoveryEngine {
    DiscoveryEngine::new(config, test_fetcher())
}

// ============================================================================
// Single Domain
// ============================================================================

#[tokio::test]
async fn test_discovers_from_every_source_kind() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount(&server, "/rss.xml", 200, rss_feed(&base, 3), "application/rss+xml").await;
    // Soft 404: status 200 but HTML, must not count as a feed
    mount(&server, "/feed", 200, SOFT_404_HTML.to_string(), "text/html").await;
    mount(
        &server,
        "/robots.txt",
        200,
        format!("User-agent: *\nDisallow:\n\nSitemap: {base}/custom-sitemap.xml\n"),
        "text/plain",
    )
    .await;
    mount(
        &server,
        "/custom-sitemap.xml",
        200,
        urlset(&[
            format!("{base}/news/2024/alpha"),
            format!("{base}/category/sports"),
            format!("{base}/about"),
            format!("{base}/2023/11/04/beta"),
            format!("{base}/img/logo.png"),
        ]),
        "application/xml",
    )
    .await;
    mount(
        &server,
        "/",
        200,
        homepage_with_feed_link("/alt-feed.atom"),
        "text/html",
    )
    .await;
    mount(
        &server,
        "/alt-feed.atom",
        200,
        RELATIVE_ATOM_FEED.to_string(),
        "application/atom+xml",
    )
    .await;

    let report = engine(DiscoveryConfig::default())
        .discover_domain(&base)
        .await;

    assert_eq!(
        report.feeds,
        vec![format!("{base}/rss.xml"), format!("{base}/alt-feed.atom")]
    );
    assert_eq!(report.sitemaps[0], format!("{base}/custom-sitemap.xml"));
    assert!(report.sitemaps.contains(&format!("{base}/sitemap.xml")));

    let expected = [
        format!("{base}/news/story-1"),
        format!("{base}/news/story-2"),
        format!("{base}/news/story-3"),
        format!("{base}/blog/launch-notes"),
        format!("{base}/news/2024/alpha"),
        format!("{base}/2023/11/04/beta"),
    ];
    assert_eq!(report.urls, expected);
    assert!(report.failed_probes > 0);
}

#[tokio::test]
async fn test_sitemap_index_skips_broken_child() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount(
        &server,
        "/sitemap_index.xml",
        200,
        sitemap_index(&[
            format!("{base}/sitemap-broken.xml"),
            format!("{base}/sitemap-news.xml"),
        ]),
        "application/xml",
    )
    .await;
    mount(&server, "/sitemap-broken.xml", 500, String::new(), "text/plain").await;
    mount(
        &server,
        "/sitemap-news.xml",
        200,
        urlset(&[
            format!("{base}/story/one"),
            format!("{base}/story/two"),
            format!("{base}/tag/world"),
        ]),
        "application/xml",
    )
    .await;

    let report = engine(DiscoveryConfig::default())
        .discover_domain(&base)
        .await;

    assert!(report.feeds.is_empty());
    assert_eq!(
        report.urls,
        vec![format!("{base}/story/one"), format!("{base}/story/two")]
    );
}

#[tokio::test]
async fn test_caps_limit_feed_entries_and_sitemap_urls() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount(&server, "/rss.xml", 200, rss_feed(&base, 10), "application/rss+xml").await;
    let sitemap_urls: Vec<String> = (1..=10)
        .map(|i| format!("{base}/article/entry-{i}"))
        .collect();
    mount(&server, "/sitemap.xml", 200, urlset(&sitemap_urls), "application/xml").await;

    let config = DiscoveryConfig {
        feed_entry_cap: 2,
        sitemap_url_cap: 3,
        ..DiscoveryConfig::default()
    };
    let report = engine(config).discover_domain(&base).await;

    assert_eq!(
        report.urls,
        vec![
            format!("{base}/news/story-1"),
            format!("{base}/news/story-2"),
            format!("{base}/article/entry-1"),
            format!("{base}/article/entry-2"),
            format!("{base}/article/entry-3"),
        ]
    );
}

#[tokio::test]
async fn test_sitemap_walk_stops_fetching_at_cap() {
    let server = MockServer::start().await;
    let base = server.uri();

    let children: Vec<String> = (1..=40)
        .map(|i| format!("{base}/sitemap-part-{i}.xml"))
        .collect();
    mount(
        &server,
        "/sitemap_index.xml",
        200,
        sitemap_index(&children),
        "application/xml",
    )
    .await;
    for i in 1..=40 {
        let urls: Vec<String> = (1..=5)
            .map(|j| format!("{base}/news/part-{i}-story-{j}"))
            .collect();
        mount(
            &server,
            &format!("/sitemap-part-{i}.xml"),
            200,
            urlset(&urls),
            "application/xml",
        )
        .await;
    }

    let config = DiscoveryConfig {
        sitemap_url_cap: 5,
        ..DiscoveryConfig::default()
    };
    let report = engine(config).discover_domain(&base).await;

    assert_eq!(report.urls.len(), 5);
    assert!(report.urls.iter().all(|u| u.contains("/news/part-1-")));

    let requests = server.received_requests().await.unwrap();
    let child_fetches = requests
        .iter()
        .filter(|r| r.url.path().starts_with("/sitemap-part-"))
        .count();
    assert_eq!(child_fetches, 1);
}

#[tokio::test]
async fn test_advertised_feed_at_known_path_fetched_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/rss.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(rss_feed(&base, 2).into_bytes(), "application/rss+xml"),
        )
        .expect(1)
        .mount(&server)
        .await;
    // The homepage advertises the same feed; it must not be fetched again
    mount(&server, "/", 200, homepage_with_feed_link("/rss.xml"), "text/html").await;

    let config = DiscoveryConfig {
        feed_paths: vec!["/rss.xml".to_string()],
        ..DiscoveryConfig::default()
    };
    let report = engine(config).discover_domain(&base).await;

    assert_eq!(report.feeds, vec![format!("{base}/rss.xml")]);
    assert_eq!(
        report.urls,
        vec![format!("{base}/news/story-1"), format!("{base}/news/story-2")]
    );
}

#[tokio::test]
async fn test_feed_and_sitemap_overlap_deduplicated() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount(&server, "/rss.xml", 200, rss_feed(&base, 2), "application/rss+xml").await;
    mount(
        &server,
        "/sitemap.xml",
        200,
        urlset(&[format!("{base}/news/story-2"), format!("{base}/news/story-9")]),
        "application/xml",
    )
    .await;

    let report = engine(DiscoveryConfig::default())
        .discover_domain(&base)
        .await;

    assert_eq!(
        report.urls,
        vec![
            format!("{base}/news/story-1"),
            format!("{base}/news/story-2"),
            format!("{base}/news/story-9"),
        ]
    );
}

// ============================================================================
// Multiple Domains
// ============================================================================

#[tokio::test]
async fn test_failing_domain_does_not_affect_others() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount(&server, "/rss.xml", 200, rss_feed(&base, 2), "application/rss+xml").await;

    let engine = engine(DiscoveryConfig::default());

    let dead = engine.discover_domain("http://127.0.0.1:1").await;
    assert!(dead.urls.is_empty());
    assert!(dead.failed_probes >= dead.sitemaps.len());

    let urls = engine
        .discover(&[
            "http://127.0.0.1:1".to_string(),
            "not a domain at all".to_string(),
            base.clone(),
        ])
        .await;

    assert_eq!(urls.len(), 2);
    assert!(urls.contains(&format!("{base}/news/story-1")));
}

#[tokio::test]
async fn test_no_urls_anywhere() {
    let server = MockServer::start().await;

    let urls = engine(DiscoveryConfig::default())
        .discover(&[server.uri()])
        .await;

    assert!(urls.is_empty());
}

// ============================================================================
// Discover → Ingest
// ============================================================================

#[tokio::test]
async fn test_discover_handoff_ingest() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount(&server, "/rss.xml", 200, rss_feed(&base, 3), "application/rss+xml").await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/news/story-\d+$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_html("Discovered Story Headline", "2024-03-05T08:00:00Z")),
        )
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let handoff = temp_dir.path().join("out").join("urls.txt");

    let discovered = engine(DiscoveryConfig::default())
        .discover(&[base.clone()])
        .await;
    let written = write_url_file(&handoff, &discovered).await.unwrap();
    assert_eq!(written, 3);

    let urls = read_url_file(&handoff).await.unwrap();
    assert_eq!(urls.len(), 3);

    let repository = create_sqlite_repository(temp_dir.path().join("articles.db")).unwrap();
    let summary = test_pipeline(Arc::clone(&repository))
        .run(urls)
        .await
        .unwrap();

    assert_eq!(summary.inserted, 3);
    assert_eq!(repository.count().unwrap(), 3);
}
