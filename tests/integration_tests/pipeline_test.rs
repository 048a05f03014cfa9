//! End-to-end pipeline integration tests
//!
//! Tests the complete workflow:
//! 1. Batch start and run number assignment
//! 2. HTTP fetch (mocked)
//! 3. Field extraction
//! 4. Article storage with duplicate skipping
//! 5. Batch closure

use chrono::{TimeZone, Utc};
use newsdesk::parser::CONTENT_FAILURE_MARKER;
use newsdesk::storage::{create_sqlite_repository, ArticleRepository, SharedArticleRepository};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::{HEADLINE_ONLY_HTML, STRUCTURED_DATA_HTML};
use crate::common::{article_html, test_pipeline};

fn temp_repository(dir: &TempDir) -> SharedArticleRepository {
    create_sqlite_repository(dir.path().join("articles.db")).unwrap()
}

async fn mount_articles(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/news/story-\d+$"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                article_html("Mock Server Story Headline", "2024-03-05T10:00:00Z"),
                "text/html; charset=utf-8",
            ),
        )
        .mount(server)
        .await;
}

fn story_urls(server: &MockServer, n: usize) -> Vec<String> {
    (1..=n)
        .map(|i| format!("{}/news/story-{i}", server.uri()))
        .collect()
}

// ============================================================================
// Complete Pipeline Tests
// ============================================================================

#[tokio::test]
async fn test_pipeline_stores_fetched_articles() {
    let temp_dir = TempDir::new().unwrap();
    let repository = temp_repository(&temp_dir);
    let mock_server = MockServer::start().await;
    mount_articles(&mock_server).await;

    let summary = test_pipeline(Arc::clone(&repository))
        .run(story_urls(&mock_server, 3))
        .await
        .unwrap();

    assert_eq!(summary.batch.run_number, 1);
    assert_eq!(summary.urls_total, 3);
    assert_eq!(summary.inserted, 3);
    assert_eq!(summary.fetch_failures, 0);
    assert!(!summary.cancelled);
    assert_eq!(summary.closed_rows, 3);

    let url = format!("{}/news/story-2", mock_server.uri());
    let record = repository.get_by_url(&url).unwrap().unwrap();
    assert_eq!(record.title, "Mock Server Story Headline");
    assert_eq!(
        record.publication_date,
        Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap()
    );
    assert!(record.date_extracted);
    assert_eq!(record.author.as_deref(), Some("Jane Reporter"));
    assert_eq!(record.category.as_deref(), Some("News"));
    assert_eq!(record.batch_id, summary.batch.batch_id);
    assert!(record.summary.unwrap().starts_with("The first paragraph"));
    assert!(record.content.unwrap().contains("\n\n"));
}

#[tokio::test]
async fn test_duplicate_run_stores_nothing_new_but_advances_run_number() {
    let temp_dir = TempDir::new().unwrap();
    let repository = temp_repository(&temp_dir);
    let mock_server = MockServer::start().await;
    mount_articles(&mock_server).await;
    let urls = story_urls(&mock_server, 3);

    let first = test_pipeline(Arc::clone(&repository))
        .run(urls.clone())
        .await
        .unwrap();
    assert_eq!(first.inserted, 3);
    assert_eq!(repository.count().unwrap(), 3);

    let second = test_pipeline(Arc::clone(&repository))
        .run(urls)
        .await
        .unwrap();
    assert_eq!(second.batch.run_number, first.batch.run_number + 1);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.duplicates, 3);
    assert_eq!(repository.count().unwrap(), 3);

    let batches = repository.recent_batches(10).unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].run_number, 2);
    assert_eq!(batches[0].articles_in_batch, 0);
    assert!(batches[0].closed_at.is_some());
    assert_eq!(batches[1].articles_in_batch, 3);
}

#[tokio::test]
async fn test_batch_closure_backfills_count() {
    let temp_dir = TempDir::new().unwrap();
    let repository = temp_repository(&temp_dir);
    let mock_server = MockServer::start().await;
    mount_articles(&mock_server).await;

    let summary = test_pipeline(Arc::clone(&repository))
        .run(story_urls(&mock_server, 5))
        .await
        .unwrap();

    let records = repository.list_batch(&summary.batch.batch_id).unwrap();
    assert_eq!(records.len(), 5);
    assert!(records
        .iter()
        .all(|r| r.articles_in_batch == summary.inserted as i64));
    assert!(records.iter().all(|r| r.run_number == summary.batch.run_number));
}

#[tokio::test]
async fn test_sequential_runs_number_without_gaps() {
    let temp_dir = TempDir::new().unwrap();
    let repository = temp_repository(&temp_dir);

    let mut run_numbers = Vec::new();
    for _ in 0..5 {
        let summary = test_pipeline(Arc::clone(&repository))
            .run(Vec::new())
            .await
            .unwrap();
        run_numbers.push(summary.batch.run_number);
    }

    assert_eq!(run_numbers, vec![1, 2, 3, 4, 5]);
    assert_eq!(repository.latest_run_number().unwrap(), Some(5));
}

// ============================================================================
// Extraction Through The Pipeline
// ============================================================================

#[tokio::test]
async fn test_headline_only_page_uses_fallbacks() {
    let temp_dir = TempDir::new().unwrap();
    let repository = temp_repository(&temp_dir);
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/news/headline-only"))
        .respond_with(ResponseTemplate::new(200).set_body_string(HEADLINE_ONLY_HTML))
        .mount(&mock_server)
        .await;

    let url = format!("{}/news/headline-only", mock_server.uri());
    let before = Utc::now();
    let summary = test_pipeline(Arc::clone(&repository))
        .run(vec![url.clone()])
        .await
        .unwrap();
    assert_eq!(summary.inserted, 1);

    let record = repository.get_by_url(&url).unwrap().unwrap();
    assert_eq!(record.title, "Test Headline Here");
    assert_eq!(
        record.summary.as_deref(),
        Some("Short paragraph of text here.")
    );
    assert_eq!(record.content.as_deref(), Some(CONTENT_FAILURE_MARKER));
    assert!(!record.date_extracted);
    assert!(record.publication_date >= before - chrono::Duration::seconds(1));
    // IP hosts have no registrable name
    assert_eq!(record.source, "Unknown");
}

#[tokio::test]
async fn test_structured_data_page() {
    let temp_dir = TempDir::new().unwrap();
    let repository = temp_repository(&temp_dir);
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/story/transit-budget"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STRUCTURED_DATA_HTML))
        .mount(&mock_server)
        .await;

    let url = format!("{}/story/transit-budget", mock_server.uri());
    test_pipeline(Arc::clone(&repository))
        .run(vec![url.clone()])
        .await
        .unwrap();

    let record = repository.get_by_url(&url).unwrap().unwrap();
    assert_eq!(record.title, "Council Approves New Transit Budget");
    assert_eq!(
        record.publication_date,
        Utc.with_ymd_and_hms(2024, 2, 29, 16, 45, 0).unwrap()
    );
    assert_eq!(record.author.as_deref(), Some("Sam Writer"));
    assert_eq!(record.category.as_deref(), Some("Politics"));
    let content = record.content.unwrap();
    assert!(content.starts_with("The city council approved"));
    assert!(content.ends_with("eastern districts."));
}
