// Core data structures for the newsdesk pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fields resolved from one fetched document
///
/// Every field already carries its terminal fallback except `publication_date`,
/// which stays `None` when no candidate parsed; the record builder decides the
/// stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedArticle {
    pub title: String,
    pub publication_date: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub source: String,
    pub author: Option<String>,
    pub category: Option<String>,
}

/// Identity of one ingestion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchInfo {
    pub batch_id: String,
    pub session_start: DateTime<Utc>,
    pub run_number: i64,
}

impl BatchInfo {
    /// Build a batch id of the form `batch_YYYYMMDD_HHMMSS_<8 hex>`
    ///
    /// The random suffix keeps ids unique when two runs start in the same second.
    pub fn generate_id(session_start: DateTime<Utc>) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!(
            "batch_{}_{}",
            session_start.format("%Y%m%d_%H%M%S"),
            &suffix[..8]
        )
    }
}

/// The unit of persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Auto-increment id, `None` before insertion
    pub id: Option<i64>,
    pub url: String,
    pub title: String,
    /// Falls back to `scraped_at` when no date was extracted
    pub publication_date: DateTime<Utc>,
    /// False when `publication_date` is the fetch-time fallback
    pub date_extracted: bool,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub source: String,
    pub author: Option<String>,
    pub category: Option<String>,
    pub scraped_at: DateTime<Utc>,
    pub batch_id: String,
    pub session_start: DateTime<Utc>,
    pub run_number: i64,
    /// Placeholder (0) until the batch closes
    pub articles_in_batch: i64,
}

impl ArticleRecord {
    /// Assemble a record from extracted fields and the current batch
    pub fn build(
        url: impl Into<String>,
        extracted: ExtractedArticle,
        batch: &BatchInfo,
        scraped_at: DateTime<Utc>,
    ) -> Self {
        let date_extracted = extracted.publication_date.is_some();
        Self {
            id: None,
            url: url.into(),
            title: extracted.title,
            publication_date: extracted.publication_date.unwrap_or(scraped_at),
            date_extracted,
            summary: extracted.summary,
            content: extracted.content,
            source: extracted.source,
            author: extracted.author,
            category: extracted.category,
            scraped_at,
            batch_id: batch.batch_id.clone(),
            session_start: batch.session_start,
            run_number: batch.run_number,
            articles_in_batch: 0,
        }
    }

    /// Name of the first required field that is empty, if any
    pub fn missing_required(&self) -> Option<&'static str> {
        if self.url.trim().is_empty() {
            Some("url")
        } else if self.title.trim().is_empty() {
            Some("title")
        } else {
            None
        }
    }
}

/// Result of an insert attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Row created with this id
    Inserted(i64),
    /// URL already stored; nothing written
    Duplicate,
}

/// Ledger row for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: String,
    pub run_number: i64,
    pub session_start: DateTime<Utc>,
    /// `None` while the batch is open or if closing was skipped
    pub closed_at: Option<DateTime<Utc>>,
    pub articles_in_batch: i64,
}

/// Aggregate view for the query side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_articles: i64,
    pub unique_sources: i64,
    pub latest_publication: Option<DateTime<Utc>>,
    pub oldest_publication: Option<DateTime<Utc>>,
    pub total_batches: i64,
    pub latest_run_number: Option<i64>,
}

/// Outcome of one ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub batch: BatchInfo,
    pub urls_total: usize,
    pub inserted: u64,
    pub duplicates: u64,
    pub fetch_failures: u64,
    pub invalid: u64,
    pub storage_errors: u64,
    /// Whether the run stopped before every URL was processed
    pub cancelled: bool,
    /// Rows updated by the closing step
    pub closed_rows: usize,
    #[serde(with = "duration_secs")]
    pub duration: Duration,
}

impl RunSummary {
    /// URLs that reached a terminal outcome
    pub fn processed(&self) -> u64 {
        self.inserted + self.duplicates + self.fetch_failures + self.invalid + self.storage_errors
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}
