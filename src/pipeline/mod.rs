//! Ingestion pipeline
//!
//! One run drives every candidate URL through fetch → extract → persist and
//! tags each inserted record with the run's batch.
//!
//! ```text
//!              begin_batch (committed before any fetch)
//!                          │
//! ┌─────────────┐     ┌────▼────────────────────────┐
//! │   URL       │     │  Workers (bounded pool)     │
//! │  Producer   │────▶│  fetch → extract → insert   │──▶ RunStats (atomic)
//! └─────────────┘     └─────────────────────────────┘
//!       │  mpsc channel             │
//!       │                      join barrier
//!  cancellation                     │
//!                          close_batch(inserted)
//! ```
//!
//! Duplicate URLs are resolved by the store's unique constraint, never by a
//! pre-check, so concurrent workers racing on the same URL still yield one row.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::PipelineSettings;
use crate::crawler::Fetcher;
use crate::error::{Error, Result};
use crate::metrics::{self, UrlOutcome};
use crate::models::{ArticleRecord, BatchInfo, InsertOutcome, RunSummary};
use crate::parser::ArticleExtractor;
use crate::storage::SharedArticleRepository;

// ============================================================================
// Run Statistics
// ============================================================================

/// Per-run counters shared by all workers
#[derive(Debug, Default)]
pub struct RunStats {
    pub inserted: AtomicU64,
    pub duplicates: AtomicU64,
    pub fetch_failures: AtomicU64,
    pub invalid: AtomicU64,
    pub storage_errors: AtomicU64,
}

impl RunStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, outcome: UrlOutcome) {
        let counter = match outcome {
            UrlOutcome::Inserted => &self.inserted,
            UrlOutcome::Duplicate => &self.duplicates,
            UrlOutcome::FetchFailed => &self.fetch_failures,
            UrlOutcome::Invalid => &self.invalid,
            UrlOutcome::StorageError => &self.storage_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::record_url_outcome(outcome);
    }

    pub fn processed(&self) -> u64 {
        self.inserted.load(Ordering::Relaxed)
            + self.duplicates.load(Ordering::Relaxed)
            + self.fetch_failures.load(Ordering::Relaxed)
            + self.invalid.load(Ordering::Relaxed)
            + self.storage_errors.load(Ordering::Relaxed)
    }
}

// ============================================================================
// Pipeline Implementation
// ============================================================================

/// Collaborators every worker needs
struct WorkerContext {
    fetcher: Arc<Fetcher>,
    extractor: Arc<ArticleExtractor>,
    repository: SharedArticleRepository,
    batch: BatchInfo,
    stats: Arc<RunStats>,
}

/// Drives one batch of candidate URLs into storage
pub struct IngestionPipeline {
    fetcher: Arc<Fetcher>,
    extractor: Arc<ArticleExtractor>,
    repository: SharedArticleRepository,
    settings: PipelineSettings,
    cancel: CancellationToken,
}

impl IngestionPipeline {
    pub fn new(
        settings: PipelineSettings,
        fetcher: Arc<Fetcher>,
        extractor: Arc<ArticleExtractor>,
        repository: SharedArticleRepository,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            repository,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned token (Ctrl-C handler, scheduler)
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops the run between URLs when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run one batch over `urls`
    ///
    /// # Errors
    ///
    /// - `Error::Storage` if the batch cannot be opened; nothing is fetched
    /// - `Error::Storage` if the closing update fails; inserted rows remain
    ///
    /// Per-URL failures are counted in the summary, never returned.
    pub async fn run(&self, urls: Vec<String>) -> Result<RunSummary> {
        let started = Instant::now();
        let urls_total = urls.len();

        // Starting: the run number must be committed before any worker fetches
        let repository = Arc::clone(&self.repository);
        let session_start = Utc::now();
        let batch = tokio::task::spawn_blocking(move || repository.begin_batch(session_start))
            .await
            .map_err(|e| Error::pipeline(format!("begin_batch task failed: {e}")))??;

        tracing::info!(
            batch_id = %batch.batch_id,
            run_number = batch.run_number,
            urls = urls_total,
            workers = self.settings.workers,
            "Starting ingestion run"
        );

        let run_token = self.cancel.child_token();
        let timer = self.spawn_run_timer(run_token.clone());

        let stats = RunStats::new();
        let context = Arc::new(WorkerContext {
            fetcher: Arc::clone(&self.fetcher),
            extractor: Arc::clone(&self.extractor),
            repository: Arc::clone(&self.repository),
            batch: batch.clone(),
            stats: Arc::clone(&stats),
        });

        let (url_tx, url_rx) = mpsc::channel::<String>(self.settings.channel_buffer_size.max(1));
        let handles = self.spawn_workers(url_rx, Arc::clone(&context), run_token.clone());

        for url in urls {
            tokio::select! {
                biased;
                _ = run_token.cancelled() => {
                    tracing::warn!(batch_id = %batch.batch_id, "Run cancelled, no further URLs queued");
                    break;
                }
                sent = url_tx.send(url) => {
                    if sent.is_err() {
                        tracing::error!("URL channel closed");
                        break;
                    }
                }
            }
        }
        drop(url_tx);

        // Barrier: the closing update reads the counter only after every worker exits
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Worker task panicked");
            }
        }
        if let Some(timer) = timer {
            timer.abort();
        }

        let inserted = stats.inserted.load(Ordering::SeqCst);
        let repository = Arc::clone(&self.repository);
        let batch_id = batch.batch_id.clone();
        let closed_rows = tokio::task::spawn_blocking(move || {
            repository.close_batch(&batch_id, inserted as i64)
        })
        .await
        .map_err(|e| Error::pipeline(format!("close_batch task failed: {e}")))?
        .map_err(|e| {
            tracing::error!(batch_id = %batch.batch_id, error = %e, "Failed to close batch");
            e
        })?;

        let summary = RunSummary {
            batch,
            urls_total,
            inserted,
            duplicates: stats.duplicates.load(Ordering::SeqCst),
            fetch_failures: stats.fetch_failures.load(Ordering::SeqCst),
            invalid: stats.invalid.load(Ordering::SeqCst),
            storage_errors: stats.storage_errors.load(Ordering::SeqCst),
            cancelled: (stats.processed() as usize) < urls_total,
            closed_rows,
            duration: started.elapsed(),
        };

        tracing::info!(
            batch_id = %summary.batch.batch_id,
            run_number = summary.batch.run_number,
            inserted = summary.inserted,
            duplicates = summary.duplicates,
            fetch_failures = summary.fetch_failures,
            invalid = summary.invalid,
            storage_errors = summary.storage_errors,
            cancelled = summary.cancelled,
            duration_secs = summary.duration.as_secs_f64(),
            "Ingestion run completed"
        );
        metrics::record_run(
            summary.batch.run_number,
            summary.inserted,
            summary.duration.as_secs_f64(),
        );

        Ok(summary)
    }

    /// Cancel `token` once the configured run timeout elapses
    fn spawn_run_timer(&self, token: CancellationToken) -> Option<JoinHandle<()>> {
        let timeout = self.settings.run_timeout()?;

        Some(tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {
                    tracing::warn!(timeout_secs = timeout.as_secs(), "Run timeout reached");
                    token.cancel();
                }
                _ = token.cancelled() => {}
            }
        }))
    }

    fn spawn_workers(
        &self,
        url_rx: mpsc::Receiver<String>,
        context: Arc<WorkerContext>,
        token: CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        let url_rx = Arc::new(tokio::sync::Mutex::new(url_rx));
        let workers = self.settings.workers.max(1);
        let mut handles = Vec::with_capacity(workers);

        for worker_id in 0..workers {
            let url_rx = Arc::clone(&url_rx);
            let context = Arc::clone(&context);
            let token = token.clone();

            let handle = tokio::spawn(async move {
                loop {
                    if token.is_cancelled() {
                        break;
                    }

                    let url = {
                        let mut rx = url_rx.lock().await;
                        rx.recv().await
                    };

                    let Some(url) = url else {
                        break; // Channel closed
                    };

                    let outcome = process_url(&context, url).await;
                    context.stats.record(outcome);
                }

                tracing::debug!(worker_id, "Ingestion worker shutting down");
            });

            handles.push(handle);
        }

        handles
    }
}

/// Fetch, extract and persist one URL; every failure is absorbed here
async fn process_url(context: &WorkerContext, url: String) -> UrlOutcome {
    let page = match context.fetcher.fetch(&url).await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!(
                url = %url,
                error = %e,
                retry_next_run = e.is_recoverable(),
                "Fetch failed, skipping"
            );
            return UrlOutcome::FetchFailed;
        }
    };

    // The record keeps the candidate URL so duplicate detection matches discovery
    if page.final_url != url {
        tracing::debug!(url = %url, final_url = %page.final_url, "Followed redirect");
    }

    let scraped_at = Utc::now();
    let extracted = context.extractor.extract(&url, &page.body);
    let record = ArticleRecord::build(url, extracted, &context.batch, scraped_at);

    if let Some(field) = record.missing_required() {
        tracing::warn!(url = %record.url, field, "Required field empty, skipping");
        return UrlOutcome::Invalid;
    }

    let repository = Arc::clone(&context.repository);
    let url = record.url.clone();
    let inserted = tokio::task::spawn_blocking(move || repository.insert(&record)).await;

    match inserted {
        Ok(Ok(InsertOutcome::Inserted(id))) => {
            tracing::debug!(url = %url, id, "Article stored");
            UrlOutcome::Inserted
        }
        Ok(Ok(InsertOutcome::Duplicate)) => {
            tracing::info!(url = %url, "Duplicate URL, skipping");
            UrlOutcome::Duplicate
        }
        Ok(Err(e)) => {
            tracing::error!(
                url = %url,
                error = %e,
                retry_next_run = e.is_recoverable(),
                "Failed to store article"
            );
            UrlOutcome::StorageError
        }
        Err(e) => {
            tracing::error!(url = %url, error = %e, "Storage task failed");
            UrlOutcome::StorageError
        }
    }
}
