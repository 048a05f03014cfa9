pub mod discover;
pub mod ingest;
pub mod run;
pub mod stats;

// Re-export command functions for convenience
pub use discover::discover;
pub use ingest::ingest;
pub use run::run;
pub use stats::stats;

use anyhow::{Context, Result};
use std::path::Path;
use tokio_util::sync::CancellationToken;

use newsdesk::config::Config;

/// Load config from a TOML file when given, otherwise from the environment
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env().context("Failed to load configuration from environment")?,
    };
    config.validate()?;
    Ok(config)
}

/// Token cancelled on Ctrl-C; the pipeline stops queueing URLs when it fires
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight URLs");
            trigger.cancel();
        }
    });

    token
}

/// Keep at most `max` URLs; 0 means unlimited
pub fn cap_urls(mut urls: Vec<String>, max: usize) -> Vec<String> {
    if max > 0 && urls.len() > max {
        tracing::info!(discovered = urls.len(), max, "Capping URL list");
        urls.truncate(max);
    }
    urls
}
