use anyhow::{Context, Result};
use serde::Serialize;

use newsdesk::config::Config;
use newsdesk::models::{BatchSummary, StoreStats};
use newsdesk::storage::{ArticleRepository, SqliteArticleRepository};

#[derive(Serialize)]
struct StatsReport {
    stats: StoreStats,
    recent_batches: Vec<BatchSummary>,
}

/// Print store statistics and the most recent batches
pub fn stats(config: &Config, batches: usize, json: bool) -> Result<()> {
    let path = &config.database.sqlite_path;
    if !path.exists() {
        println!("Database not found: {}", path.display());
        println!("Run an ingest first to create the database.");
        return Ok(());
    }

    let repository = SqliteArticleRepository::open(path).context("Failed to open database")?;
    let report = StatsReport {
        stats: repository.stats()?,
        recent_batches: repository.recent_batches(batches)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let stats = &report.stats;
    println!("Database Stats");
    println!("--------------");
    println!("Total articles: {}", stats.total_articles);
    println!("Sources: {}", stats.unique_sources);
    println!("Batches: {}", stats.total_batches);
    if let Some(run) = stats.latest_run_number {
        println!("Latest run: {run}");
    }
    if let (Some(oldest), Some(latest)) = (stats.oldest_publication, stats.latest_publication) {
        println!("Publication range: {} .. {}", oldest.to_rfc3339(), latest.to_rfc3339());
    }

    if !report.recent_batches.is_empty() {
        println!("\nRecent Batches");
        println!("--------------");
        for batch in &report.recent_batches {
            // Unclosed batches keep the placeholder count
            let count = match batch.closed_at {
                Some(_) => batch.articles_in_batch.to_string(),
                None => "?".to_string(),
            };
            println!(
                "#{:<5} {}  {}  articles: {}",
                batch.run_number,
                batch.batch_id,
                batch.session_start.format("%Y-%m-%d %H:%M:%S"),
                count
            );
        }
    }

    Ok(())
}
