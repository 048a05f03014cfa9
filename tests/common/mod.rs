//! Common test utilities

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use newsdesk::config::PipelineSettings;
use newsdesk::crawler::Fetcher;
use newsdesk::models::{ArticleRecord, BatchInfo, ExtractedArticle};
use newsdesk::parser::ArticleExtractor;
use newsdesk::pipeline::IngestionPipeline;
use newsdesk::storage::SharedArticleRepository;
use std::sync::Arc;
use std::time::Duration;

/// Fetcher tuned for local mock servers: no effective rate limit, short timeout
pub fn test_fetcher() -> Arc<Fetcher> {
    Arc::new(Fetcher::with_settings(1000, Duration::from_secs(5), "en-US").unwrap())
}

/// Pipeline settings small enough for tests
pub fn test_settings() -> PipelineSettings {
    PipelineSettings {
        workers: 2,
        channel_buffer_size: 16,
        max_urls: 0,
        run_timeout_secs: 30,
    }
}

pub fn test_pipeline(repository: SharedArticleRepository) -> IngestionPipeline {
    IngestionPipeline::new(
        test_settings(),
        test_fetcher(),
        Arc::new(ArticleExtractor::default()),
        repository,
    )
}

/// Article page with an h1 headline, a published_time meta tag and three body paragraphs
pub fn article_html(title: &str, published: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>{title} | Example News</title>
  <meta property="article:published_time" content="{published}">
  <meta name="author" content="Jane Reporter">
</head>
<body>
  <h1>{title}</h1>
  <article>
    <p>The first paragraph of the story explains what happened and where it happened.</p>
    <p>The second paragraph adds detail from officials who spoke on condition of anonymity.</p>
    <p>The third paragraph closes with context about what is expected to happen next.</p>
  </article>
</body>
</html>"#
    )
}

pub fn test_batch(run_number: i64) -> BatchInfo {
    let session_start = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
    BatchInfo {
        batch_id: BatchInfo::generate_id(session_start),
        session_start,
        run_number,
    }
}

pub fn test_extracted(title: &str) -> ExtractedArticle {
    ExtractedArticle {
        title: title.to_string(),
        publication_date: Some(Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap()),
        summary: Some("A summary paragraph long enough to count.".to_string()),
        content: Some("Body text.".to_string()),
        source: "Test".to_string(),
        author: Some("Jane Reporter".to_string()),
        category: Some("News".to_string()),
    }
}

/// Record for `url` in `batch` with a fixed title
pub fn test_record(url: &str, batch: &BatchInfo) -> ArticleRecord {
    ArticleRecord::build(url, test_extracted("Example Headline"), batch, Utc::now())
}
