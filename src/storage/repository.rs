//! Repository pattern for article persistence
//!
//! The pipeline talks to [`ArticleRepository`]; SQLite is the production
//! backend and [`MockArticleRepository`] keeps everything in memory for tests.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │               IngestionPipeline / stats command             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ArticleRepository                        │
//! └─────────────────────────────────────────────────────────────┘
//!                   │                         │
//!                   ▼                         ▼
//!          ┌─────────────────┐       ┌─────────────────┐
//!          │     SQLite      │       │      Mock       │
//!          └─────────────────┘       └─────────────────┘
//! ```
//!
//! URL uniqueness is enforced by the store itself: SQLite through a `UNIQUE`
//! constraint, the mock through a single write lock around check-and-insert.
//! Callers never pre-check.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::models::{ArticleRecord, BatchInfo, BatchSummary, InsertOutcome, StoreStats};
use crate::utils::error::StorageError;

type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// Repository Trait
// ============================================================================

/// Persistence boundary for article records and the batch ledger
pub trait ArticleRepository: Send + Sync {
    /// Open a batch: assign the next run number and record it
    ///
    /// The ledger row is committed before this returns, so two runs can never
    /// observe the same run number.
    fn begin_batch(&self, session_start: DateTime<Utc>) -> Result<BatchInfo>;

    /// Insert a record; an existing URL yields [`InsertOutcome::Duplicate`]
    fn insert(&self, record: &ArticleRecord) -> Result<InsertOutcome>;

    /// Back-fill `articles_in_batch` on every row of the batch and close it
    ///
    /// Returns the number of article rows updated.
    fn close_batch(&self, batch_id: &str, articles_in_batch: i64) -> Result<usize>;

    /// Look up a stored record by URL
    fn get_by_url(&self, url: &str) -> Result<Option<ArticleRecord>>;

    /// Total stored records
    fn count(&self) -> Result<usize>;

    /// All records of one batch, oldest first
    fn list_batch(&self, batch_id: &str) -> Result<Vec<ArticleRecord>>;

    /// Most recent ledger rows, newest run first
    fn recent_batches(&self, limit: usize) -> Result<Vec<BatchSummary>>;

    /// Aggregate counts for the query side
    fn stats(&self) -> Result<StoreStats>;

    /// Highest run number seen in either articles or the ledger
    fn latest_run_number(&self) -> Result<Option<i64>>;
}

// ============================================================================
// SQLite Implementation
// ============================================================================

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        publication_date TEXT NOT NULL,
        date_extracted INTEGER NOT NULL DEFAULT 1,
        summary TEXT,
        content TEXT,
        source TEXT NOT NULL DEFAULT 'Unknown',
        author TEXT,
        category TEXT,
        scraped_at TEXT NOT NULL,
        scraping_batch_id TEXT NOT NULL,
        scraping_session_start TEXT NOT NULL,
        scraping_run_number INTEGER NOT NULL,
        articles_in_batch INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_articles_source ON articles(source);
    CREATE INDEX IF NOT EXISTS idx_articles_publication_date ON articles(publication_date DESC);
    CREATE INDEX IF NOT EXISTS idx_articles_scraped_at ON articles(scraped_at DESC);
    CREATE INDEX IF NOT EXISTS idx_articles_batch_id ON articles(scraping_batch_id);
    CREATE INDEX IF NOT EXISTS idx_articles_session_start ON articles(scraping_session_start DESC);
    CREATE INDEX IF NOT EXISTS idx_articles_run_number ON articles(scraping_run_number DESC);

    CREATE TABLE IF NOT EXISTS batches (
        batch_id TEXT PRIMARY KEY,
        run_number INTEGER NOT NULL UNIQUE,
        session_start TEXT NOT NULL,
        closed_at TEXT,
        articles_in_batch INTEGER NOT NULL DEFAULT 0
    );
"#;

const ARTICLE_COLUMNS: &str = "id, url, title, publication_date, date_extracted, summary, \
     content, source, author, category, scraped_at, scraping_batch_id, \
     scraping_session_start, scraping_run_number, articles_in_batch";

/// SQLite implementation of [`ArticleRepository`]
///
/// Uses `Mutex` to serialize access to the connection.
pub struct SqliteArticleRepository {
    conn: Mutex<Connection>,
}

impl SqliteArticleRepository {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(|e| {
            StorageError::Unavailable(format!("cannot open {}: {e}", path.display()))
        })?;

        // WAL keeps readers (stats, query API) off the writer's back
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite repository initialized");
        Ok(repo)
    }

    /// In-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;
        Ok(repo)
    }

    fn create_schema(&self) -> Result<()> {
        self.lock()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Unavailable("connection lock poisoned".to_string()))
    }
}

impl ArticleRepository for SqliteArticleRepository {
    fn begin_batch(&self, session_start: DateTime<Utc>) -> Result<BatchInfo> {
        let mut conn = self.lock()?;
        // IMMEDIATE takes the write lock up front so the read and insert are atomic
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let max: i64 = tx.query_row(
            "SELECT COALESCE(MAX(n), 0) FROM (
                 SELECT MAX(scraping_run_number) AS n FROM articles
                 UNION ALL
                 SELECT MAX(run_number) AS n FROM batches
             )",
            [],
            |row| row.get(0),
        )?;

        let batch = BatchInfo {
            batch_id: BatchInfo::generate_id(session_start),
            session_start,
            run_number: max + 1,
        };

        tx.execute(
            "INSERT INTO batches (batch_id, run_number, session_start) VALUES (?1, ?2, ?3)",
            params![
                batch.batch_id,
                batch.run_number,
                batch.session_start.to_rfc3339()
            ],
        )?;
        tx.commit()?;

        Ok(batch)
    }

    fn insert(&self, record: &ArticleRecord) -> Result<InsertOutcome> {
        if let Some(field) = record.missing_required() {
            return Err(StorageError::InvalidRecord(format!("{field} is empty")));
        }

        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO articles (
                 url, title, publication_date, date_extracted, summary, content, source,
                 author, category, scraped_at, scraping_batch_id, scraping_session_start,
                 scraping_run_number, articles_in_batch
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                record.url,
                record.title,
                record.publication_date.to_rfc3339(),
                record.date_extracted,
                record.summary,
                record.content,
                record.source,
                record.author,
                record.category,
                record.scraped_at.to_rfc3339(),
                record.batch_id,
                record.session_start.to_rfc3339(),
                record.run_number,
                record.articles_in_batch,
            ],
        );

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted(conn.last_insert_rowid())),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    fn close_batch(&self, batch_id: &str, articles_in_batch: i64) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE articles SET articles_in_batch = ?1 WHERE scraping_batch_id = ?2",
            params![articles_in_batch, batch_id],
        )?;
        tx.execute(
            "UPDATE batches SET articles_in_batch = ?1, closed_at = ?2 WHERE batch_id = ?3",
            params![articles_in_batch, Utc::now().to_rfc3339(), batch_id],
        )?;
        tx.commit()?;

        Ok(updated)
    }

    fn get_by_url(&self, url: &str) -> Result<Option<ArticleRecord>> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE url = ?1"),
                params![url],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn list_batch(&self, batch_id: &str) -> Result<Vec<ArticleRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE scraping_batch_id = ?1 ORDER BY id"
        ))?;
        let records = stmt
            .query_map(params![batch_id], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn recent_batches(&self, limit: usize) -> Result<Vec<BatchSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT batch_id, run_number, session_start, closed_at, articles_in_batch
             FROM batches ORDER BY run_number DESC LIMIT ?1",
        )?;
        let batches = stmt
            .query_map(params![limit as i64], |row| {
                Ok(BatchSummary {
                    batch_id: row.get(0)?,
                    run_number: row.get(1)?,
                    session_start: parse_timestamp(row, 2)?,
                    closed_at: parse_optional_timestamp(row, 3)?,
                    articles_in_batch: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(batches)
    }

    fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock()?;

        let (total_articles, unique_sources, latest, oldest) = conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT source), MAX(publication_date), MIN(publication_date)
             FROM articles",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    parse_optional_timestamp(row, 2)?,
                    parse_optional_timestamp(row, 3)?,
                ))
            },
        )?;

        let (total_batches, latest_run_number) = conn.query_row(
            "SELECT COUNT(*), MAX(run_number) FROM batches",
            [],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Option<i64>>(1)?)),
        )?;

        Ok(StoreStats {
            total_articles,
            unique_sources,
            latest_publication: latest,
            oldest_publication: oldest,
            total_batches,
            latest_run_number,
        })
    }

    fn latest_run_number(&self) -> Result<Option<i64>> {
        let conn = self.lock()?;
        let max: Option<i64> = conn.query_row(
            "SELECT MAX(n) FROM (
                 SELECT MAX(scraping_run_number) AS n FROM articles
                 UNION ALL
                 SELECT MAX(run_number) AS n FROM batches
             )",
            [],
            |row| row.get(0),
        )?;
        Ok(max)
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_optional_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(_) => parse_timestamp(row, idx).map(Some),
        None => Ok(None),
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ArticleRecord> {
    Ok(ArticleRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        publication_date: parse_timestamp(row, 3)?,
        date_extracted: row.get(4)?,
        summary: row.get(5)?,
        content: row.get(6)?,
        source: row.get(7)?,
        author: row.get(8)?,
        category: row.get(9)?,
        scraped_at: parse_timestamp(row, 10)?,
        batch_id: row.get(11)?,
        session_start: parse_timestamp(row, 12)?,
        run_number: row.get(13)?,
        articles_in_batch: row.get(14)?,
    })
}

// ============================================================================
// Mock Implementation (for testing)
// ============================================================================

#[derive(Default)]
struct MockState {
    articles: Vec<ArticleRecord>,
    by_url: HashMap<String, usize>,
    batches: Vec<BatchSummary>,
}

/// In-memory [`ArticleRepository`]
///
/// Check-and-insert runs under one write lock, so concurrent inserts of the
/// same URL still produce exactly one row.
#[derive(Default)]
pub struct MockArticleRepository {
    state: RwLock<MockState>,
}

impl MockArticleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MockState>> {
        self.state
            .read()
            .map_err(|_| StorageError::Unavailable("mock state poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MockState>> {
        self.state
            .write()
            .map_err(|_| StorageError::Unavailable("mock state poisoned".to_string()))
    }
}

impl ArticleRepository for MockArticleRepository {
    fn begin_batch(&self, session_start: DateTime<Utc>) -> Result<BatchInfo> {
        let mut state = self.write()?;
        let max = state
            .articles
            .iter()
            .map(|a| a.run_number)
            .chain(state.batches.iter().map(|b| b.run_number))
            .max()
            .unwrap_or(0);

        let batch = BatchInfo {
            batch_id: BatchInfo::generate_id(session_start),
            session_start,
            run_number: max + 1,
        };
        state.batches.push(BatchSummary {
            batch_id: batch.batch_id.clone(),
            run_number: batch.run_number,
            session_start,
            closed_at: None,
            articles_in_batch: 0,
        });

        Ok(batch)
    }

    fn insert(&self, record: &ArticleRecord) -> Result<InsertOutcome> {
        if let Some(field) = record.missing_required() {
            return Err(StorageError::InvalidRecord(format!("{field} is empty")));
        }

        let mut state = self.write()?;
        if state.by_url.contains_key(&record.url) {
            return Ok(InsertOutcome::Duplicate);
        }

        let id = state.articles.len() as i64 + 1;
        let mut stored = record.clone();
        stored.id = Some(id);

        let idx = state.articles.len();
        state.by_url.insert(stored.url.clone(), idx);
        state.articles.push(stored);

        Ok(InsertOutcome::Inserted(id))
    }

    fn close_batch(&self, batch_id: &str, articles_in_batch: i64) -> Result<usize> {
        let mut state = self.write()?;

        let mut updated = 0;
        for article in state.articles.iter_mut().filter(|a| a.batch_id == batch_id) {
            article.articles_in_batch = articles_in_batch;
            updated += 1;
        }

        if let Some(batch) = state.batches.iter_mut().find(|b| b.batch_id == batch_id) {
            batch.articles_in_batch = articles_in_batch;
            batch.closed_at = Some(Utc::now());
        }

        Ok(updated)
    }

    fn get_by_url(&self, url: &str) -> Result<Option<ArticleRecord>> {
        let state = self.read()?;
        Ok(state.by_url.get(url).map(|&idx| state.articles[idx].clone()))
    }

    fn count(&self) -> Result<usize> {
        Ok(self.read()?.articles.len())
    }

    fn list_batch(&self, batch_id: &str) -> Result<Vec<ArticleRecord>> {
        let state = self.read()?;
        Ok(state
            .articles
            .iter()
            .filter(|a| a.batch_id == batch_id)
            .cloned()
            .collect())
    }

    fn recent_batches(&self, limit: usize) -> Result<Vec<BatchSummary>> {
        let state = self.read()?;
        let mut batches = state.batches.clone();
        batches.sort_by(|a, b| b.run_number.cmp(&a.run_number));
        batches.truncate(limit);
        Ok(batches)
    }

    fn stats(&self) -> Result<StoreStats> {
        let state = self.read()?;
        let sources: std::collections::HashSet<&str> =
            state.articles.iter().map(|a| a.source.as_str()).collect();

        Ok(StoreStats {
            total_articles: state.articles.len() as i64,
            unique_sources: sources.len() as i64,
            latest_publication: state.articles.iter().map(|a| a.publication_date).max(),
            oldest_publication: state.articles.iter().map(|a| a.publication_date).min(),
            total_batches: state.batches.len() as i64,
            latest_run_number: state.batches.iter().map(|b| b.run_number).max(),
        })
    }

    fn latest_run_number(&self) -> Result<Option<i64>> {
        let state = self.read()?;
        Ok(state
            .articles
            .iter()
            .map(|a| a.run_number)
            .chain(state.batches.iter().map(|b| b.run_number))
            .max())
    }
}

// ============================================================================
// Shared Repository Types
// ============================================================================

/// Thread-safe shared repository handle
pub type SharedArticleRepository = Arc<dyn ArticleRepository>;

/// Open a shared SQLite repository
pub fn create_sqlite_repository(path: impl AsRef<Path>) -> Result<SharedArticleRepository> {
    Ok(Arc::new(SqliteArticleRepository::open(path)?))
}

/// Create a shared mock repository
pub fn create_mock_repository() -> SharedArticleRepository {
    Arc::new(MockArticleRepository::new())
}

// ============================================================================
// Tests
// ============================================================================
