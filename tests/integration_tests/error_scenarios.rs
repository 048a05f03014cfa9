//! Error scenario integration tests
//!
//! Tests various failure modes and error handling:
//! 1. HTTP error responses (404, 500)
//! 2. Request timeouts and run timeouts
//! 3. Storage that cannot be opened or fails mid-run
//! 4. Duplicate URLs inside one run

use chrono::{DateTime, Utc};
use newsdesk::config::PipelineSettings;
use newsdesk::crawler::Fetcher;
use newsdesk::error::Error;
use newsdesk::models::{ArticleRecord, BatchInfo, BatchSummary, InsertOutcome, StoreStats};
use newsdesk::parser::ArticleExtractor;
use newsdesk::pipeline::IngestionPipeline;
use newsdesk::storage::{
    create_mock_repository, ArticleRepository, MockArticleRepository, SharedArticleRepository,
    SqliteArticleRepository,
};
use newsdesk::utils::error::StorageError;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::NOT_FOUND_HTML;
use crate::common::{article_html, test_fetcher, test_pipeline, test_settings};

/// Repository whose batch bookkeeping works but whose inserts or batch starts fail
struct FlakyRepository {
    inner: MockArticleRepository,
    fail_begin: bool,
    fail_insert: bool,
}

impl FlakyRepository {
    fn failing_inserts() -> Self {
        Self {
            inner: MockArticleRepository::new(),
            fail_begin: false,
            fail_insert: true,
        }
    }

    fn unreachable() -> Self {
        Self {
            inner: MockArticleRepository::new(),
            fail_begin: true,
            fail_insert: true,
        }
    }
}

type StorageResult<T> = std::result::Result<T, StorageError>;

impl ArticleRepository for FlakyRepository {
    fn begin_batch(&self, session_start: DateTime<Utc>) -> StorageResult<BatchInfo> {
        if self.fail_begin {
            return Err(StorageError::Unavailable("connection refused".to_string()));
        }
        self.inner.begin_batch(session_start)
    }

    fn insert(&self, record: &ArticleRecord) -> StorageResult<InsertOutcome> {
        if self.fail_insert {
            return Err(StorageError::Unavailable("connection lost".to_string()));
        }
        self.inner.insert(record)
    }

    fn close_batch(&self, batch_id: &str, articles_in_batch: i64) -> StorageResult<usize> {
        self.inner.close_batch(batch_id, articles_in_batch)
    }

    fn get_by_url(&self, url: &str) -> StorageResult<Option<ArticleRecord>> {
        self.inner.get_by_url(url)
    }

    fn count(&self) -> StorageResult<usize> {
        self.inner.count()
    }

    fn list_batch(&self, batch_id: &str) -> StorageResult<Vec<ArticleRecord>> {
        self.inner.list_batch(batch_id)
    }

    fn recent_batches(&self, limit: usize) -> StorageResult<Vec<BatchSummary>> {
        self.inner.recent_batches(limit)
    }

    fn stats(&self) -> StorageResult<StoreStats> {
        self.inner.stats()
    }

    fn latest_run_number(&self) -> StorageResult<Option<i64>> {
        self.inner.latest_run_number()
    }
}

// ============================================================================
// HTTP Error Tests
// ============================================================================

#[tokio::test]
async fn test_http_errors_skipped_without_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/news/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string(NOT_FOUND_HTML))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/news/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/news/fine"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_html("A Story That Loads Fine", "2024-03-05")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let repository = create_mock_repository();
    let base = mock_server.uri();
    let summary = test_pipeline(Arc::clone(&repository))
        .run(vec![
            format!("{base}/news/missing"),
            format!("{base}/news/broken"),
            format!("{base}/news/fine"),
        ])
        .await
        .unwrap();

    assert_eq!(summary.fetch_failures, 2);
    assert_eq!(summary.inserted, 1);
    assert!(!summary.cancelled);
    assert_eq!(repository.count().unwrap(), 1);
}

#[tokio::test]
async fn test_request_timeout_counts_as_fetch_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_html("Slow Story Headline", "2024-03-05"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::with_settings(1000, Duration::from_millis(200), "en-US").unwrap();
    let repository = create_mock_repository();
    let pipeline = IngestionPipeline::new(
        test_settings(),
        Arc::new(fetcher),
        Arc::new(ArticleExtractor::default()),
        Arc::clone(&repository),
    );

    let summary = pipeline
        .run(vec![format!("{}/news/slow", mock_server.uri())])
        .await
        .unwrap();

    assert_eq!(summary.fetch_failures, 1);
    assert_eq!(repository.count().unwrap(), 0);
}

#[tokio::test]
async fn test_run_timeout_stops_between_urls_and_closes_batch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_html("Eventually Loaded Story", "2024-03-05"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let settings = PipelineSettings {
        workers: 1,
        run_timeout_secs: 1,
        ..test_settings()
    };
    let repository = create_mock_repository();
    let pipeline = IngestionPipeline::new(
        settings,
        test_fetcher(),
        Arc::new(ArticleExtractor::default()),
        Arc::clone(&repository),
    );

    let base = mock_server.uri();
    let urls: Vec<String> = (1..=4).map(|i| format!("{base}/news/slow-{i}")).collect();
    let summary = pipeline.run(urls).await.unwrap();

    assert!(summary.cancelled);
    assert!(summary.processed() < 4);

    // Whatever made it in before the timeout carries the final count
    let batch = &repository.recent_batches(1).unwrap()[0];
    assert!(batch.closed_at.is_some());
    assert_eq!(batch.articles_in_batch, summary.inserted as i64);
    for record in repository.list_batch(&summary.batch.batch_id).unwrap() {
        assert_eq!(record.articles_in_batch, summary.inserted as i64);
    }
}

// ============================================================================
// Storage Error Tests
// ============================================================================

#[tokio::test]
async fn test_unreachable_storage_fails_before_fetching() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let repository: SharedArticleRepository = Arc::new(FlakyRepository::unreachable());
    let result = test_pipeline(repository)
        .run(vec![format!("{}/news/never-fetched", mock_server.uri())])
        .await;

    assert!(matches!(
        result,
        Err(Error::Storage(StorageError::Unavailable(_)))
    ));
}

#[tokio::test]
async fn test_insert_errors_do_not_stop_the_run() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_html("Storage Will Refuse This", "2024-03-05")),
        )
        .mount(&mock_server)
        .await;

    let repository: SharedArticleRepository = Arc::new(FlakyRepository::failing_inserts());
    let base = mock_server.uri();
    let summary = test_pipeline(Arc::clone(&repository))
        .run(vec![format!("{base}/news/a"), format!("{base}/news/b")])
        .await
        .unwrap();

    assert_eq!(summary.storage_errors, 2);
    assert_eq!(summary.inserted, 0);
    assert!(!summary.cancelled);
    assert!(repository.recent_batches(1).unwrap()[0].closed_at.is_some());
}

#[test]
fn test_sqlite_open_on_directory_fails() {
    let temp_dir = TempDir::new().unwrap();
    assert!(SqliteArticleRepository::open(temp_dir.path()).is_err());
}

#[test]
fn test_sqlite_open_under_regular_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("not-a-dir");
    std::fs::write(&blocker, "x").unwrap();

    let result = SqliteArticleRepository::open(blocker.join("articles.db"));
    assert!(result.is_err());
}

// ============================================================================
// Duplicate Handling
// ============================================================================

#[tokio::test]
async fn test_duplicate_url_within_one_run_stored_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/news/repeated"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_html("Repeated Story Headline", "2024-03-05")),
        )
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let repository: SharedArticleRepository =
        Arc::new(SqliteArticleRepository::open(temp_dir.path().join("a.db")).unwrap());
    let url = format!("{}/news/repeated", mock_server.uri());

    let summary = test_pipeline(Arc::clone(&repository))
        .run(vec![url.clone(), url.clone(), url])
        .await
        .unwrap();

    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.duplicates, 2);
    assert_eq!(repository.count().unwrap(), 1);
}
