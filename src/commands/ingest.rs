use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use newsdesk::config::Config;
use newsdesk::crawler::Fetcher;
use newsdesk::discovery::read_url_file;
use newsdesk::models::RunSummary;
use newsdesk::parser::ArticleExtractor;
use newsdesk::pipeline::IngestionPipeline;
use newsdesk::storage::open_repository;

use super::{cap_urls, shutdown_token};

/// Ingest URLs from the handoff file
pub async fn ingest(
    config: &Config,
    input: Option<PathBuf>,
    max_urls: Option<usize>,
) -> Result<RunSummary> {
    let input = input.unwrap_or_else(|| config.discovery.output_path.clone());
    let urls = read_url_file(&input)
        .await
        .with_context(|| format!("Failed to read URL list {}", input.display()))?;

    ingest_urls(config, urls, max_urls).await
}

/// Run one ingestion batch over an in-memory URL list
pub async fn ingest_urls(
    config: &Config,
    urls: Vec<String>,
    max_urls: Option<usize>,
) -> Result<RunSummary> {
    let urls = cap_urls(urls, max_urls.unwrap_or(config.pipeline.max_urls));

    println!("Starting ingestion");
    println!("==================");
    println!("URLs: {}", urls.len());
    println!("Database: {}", config.database.sqlite_path.display());

    // Fails fast: no batch, no fetching, if storage is unreachable
    let repository = open_repository(&config.database).context("Storage unavailable")?;
    let fetcher = Arc::new(Fetcher::new(&config.fetch).context("Failed to create fetcher")?);

    let pipeline = IngestionPipeline::new(
        config.pipeline.clone(),
        fetcher,
        Arc::new(ArticleExtractor::default()),
        repository,
    )
    .with_cancellation(shutdown_token());

    let summary = pipeline.run(urls).await?;
    print_summary(&summary);

    Ok(summary)
}

fn print_summary(summary: &RunSummary) {
    println!("\nRun Summary");
    println!("===========");
    println!("Batch: {}", summary.batch.batch_id);
    println!("Run number: {}", summary.batch.run_number);
    println!("Inserted: {}", summary.inserted);
    println!("Duplicates: {}", summary.duplicates);
    println!("Fetch failures: {}", summary.fetch_failures);
    println!("Invalid: {}", summary.invalid);
    println!("Storage errors: {}", summary.storage_errors);
    if summary.cancelled {
        println!(
            "Cancelled after {} of {} URLs",
            summary.processed(),
            summary.urls_total
        );
    }
    println!("Duration: {:.1}s", summary.duration.as_secs_f64());
}
