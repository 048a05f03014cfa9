use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use newsdesk::config::Config;
use newsdesk::crawler::Fetcher;
use newsdesk::discovery::{write_url_file, DiscoveryEngine};
use newsdesk::error::DiscoveryError;

/// Discover candidate URLs and write the handoff file
///
/// Returns the discovered URLs in sorted order.
pub async fn discover(
    config: &Config,
    domains: Vec<String>,
    output: Option<PathBuf>,
) -> Result<Vec<String>> {
    let domains = if domains.is_empty() {
        config.discovery.domains.clone()
    } else {
        domains
    };
    if domains.is_empty() {
        anyhow::bail!("No domains configured. Pass --domain or set discovery.domains");
    }

    let output = output.unwrap_or_else(|| config.discovery.output_path.clone());

    println!("Discovering article URLs");
    println!("========================");
    println!("Domains: {}", domains.join(", "));

    let fetcher = Arc::new(Fetcher::new(&config.fetch).context("Failed to create fetcher")?);
    let engine = DiscoveryEngine::new(config.discovery.clone(), fetcher);

    let urls: Vec<String> = engine.discover(&domains).await.into_iter().collect();
    if urls.is_empty() {
        return Err(DiscoveryError::NoUrlsDiscovered.into());
    }

    write_url_file(&output, &urls)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Discovered: {}", urls.len());
    println!("Written to: {}", output.display());

    Ok(urls)
}
