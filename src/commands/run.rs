use anyhow::Result;
use std::time::Instant;

use newsdesk::config::Config;
use newsdesk::models::RunSummary;

use super::{discover, ingest::ingest_urls};

/// Discover, then ingest, as one orchestrated run
///
/// Fails when discovery finds nothing; there is no partial credit for a run
/// that discovered URLs but could not ingest them.
pub async fn run(
    config: &Config,
    domains: Vec<String>,
    max_urls: Option<usize>,
) -> Result<RunSummary> {
    let started = Instant::now();

    let urls = discover(config, domains, None).await?;
    let summary = ingest_urls(config, urls, max_urls).await?;

    tracing::info!(
        batch_id = %summary.batch.batch_id,
        run_number = summary.batch.run_number,
        inserted = summary.inserted,
        total_secs = started.elapsed().as_secs_f64(),
        "Run finished"
    );

    Ok(summary)
}
