//! Configuration management for the newsdesk pipeline
//!
//! Configuration is loaded from environment variables or a TOML file and then
//! passed explicitly to the fetcher, discovery engine, and ingestion pipeline.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::Error;

/// Conventional feed locations probed on every domain
pub const DEFAULT_FEED_PATHS: &[&str] = &[
    "/rss.xml",
    "/rss",
    "/feed",
    "/feed.xml",
    "/feeds/all.atom.xml",
    "/atom.xml",
    "/feeds/all.rss.xml",
    "/feeds/news.xml",
    "/news/rss.xml",
];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP fetch boundary
    pub fetch: FetchConfig,

    /// URL discovery
    pub discovery: DiscoveryConfig,

    /// Ingestion run settings
    pub pipeline: PipelineSettings,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Shared HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Requests per second across all workers
    pub requests_per_second: u32,

    /// Accept-Language header value
    pub accept_language: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            requests_per_second: 5,
            accept_language: String::from("en-US,en;q=0.9"),
        }
    }
}

/// Discovery policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Root domains (bare host or full origin)
    pub domains: Vec<String>,

    /// Entries taken from each confirmed feed
    pub feed_entry_cap: usize,

    /// Accepted sitemap URLs per domain
    pub sitemap_url_cap: usize,

    /// Maximum nesting of sitemap indexes
    pub max_sitemap_depth: usize,

    /// Feed paths probed on each domain
    pub feed_paths: Vec<String>,

    /// Handoff file written by `discover` and read by `ingest`
    pub output_path: PathBuf,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            domains: Vec::new(),
            feed_entry_cap: 50,
            sitemap_url_cap: 100,
            max_sitemap_depth: 3,
            feed_paths: DEFAULT_FEED_PATHS.iter().map(|p| p.to_string()).collect(),
            output_path: PathBuf::from("discovered_urls.txt"),
        }
    }
}

/// Ingestion run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Number of concurrent workers
    pub workers: usize,

    /// Bounded channel size between producer and workers
    pub channel_buffer_size: usize,

    /// Maximum URLs ingested per run (0 = unlimited)
    pub max_urls: usize,

    /// Abort the run after this many seconds (0 = no limit)
    pub run_timeout_secs: u64,
}

impl PipelineSettings {
    /// Run timeout, `None` when `run_timeout_secs` is 0
    #[must_use]
    pub fn run_timeout(&self) -> Option<Duration> {
        match self.run_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workers: 4,
            channel_buffer_size: 256,
            max_urls: 50,
            run_timeout_secs: 1800,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub sqlite_path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/articles.db"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["text", "json"];

impl LoggingConfig {
    /// `EnvFilter` directive: the configured level for this crate, warnings
    /// for dependencies; `verbose` forces debug
    pub fn filter_directive(&self, verbose: bool) -> String {
        if verbose {
            "newsdesk=debug,info".to_string()
        } else {
            format!("newsdesk={},warn", self.level.to_ascii_lowercase())
        }
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// `NEWSDESK_DOMAINS` is a comma-separated list. The SQLite path is read
    /// from `NEWSDESK_SQLITE_PATH`, then `DATABASE_URL`.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let domains = std::env::var("NEWSDESK_DOMAINS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let sqlite_path = std::env::var("NEWSDESK_SQLITE_PATH")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map(|v| PathBuf::from(v.trim_start_matches("sqlite://")))
            .unwrap_or(defaults.database.sqlite_path);

        let output_path = std::env::var("NEWSDESK_OUTPUT_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.discovery.output_path);

        Ok(Self {
            fetch: FetchConfig {
                request_timeout_secs: env_parse(
                    "NEWSDESK_REQUEST_TIMEOUT",
                    defaults.fetch.request_timeout_secs,
                ),
                requests_per_second: env_parse(
                    "NEWSDESK_RATE_LIMIT",
                    defaults.fetch.requests_per_second,
                ),
                accept_language: std::env::var("NEWSDESK_ACCEPT_LANGUAGE")
                    .unwrap_or(defaults.fetch.accept_language),
            },
            discovery: DiscoveryConfig {
                domains,
                feed_entry_cap: env_parse(
                    "NEWSDESK_FEED_ENTRY_CAP",
                    defaults.discovery.feed_entry_cap,
                ),
                sitemap_url_cap: env_parse(
                    "NEWSDESK_SITEMAP_URL_CAP",
                    defaults.discovery.sitemap_url_cap,
                ),
                max_sitemap_depth: defaults.discovery.max_sitemap_depth,
                feed_paths: defaults.discovery.feed_paths,
                output_path,
            },
            pipeline: PipelineSettings {
                workers: env_parse("NEWSDESK_WORKERS", defaults.pipeline.workers),
                channel_buffer_size: defaults.pipeline.channel_buffer_size,
                max_urls: env_parse("NEWSDESK_MAX_URLS", defaults.pipeline.max_urls),
                run_timeout_secs: env_parse(
                    "NEWSDESK_RUN_TIMEOUT",
                    defaults.pipeline.run_timeout_secs,
                ),
            },
            database: DatabaseConfig { sqlite_path },
            logging: LoggingConfig {
                level: std::env::var("NEWSDESK_LOG_LEVEL").unwrap_or(defaults.logging.level),
                format: std::env::var("NEWSDESK_LOG_FORMAT").unwrap_or(defaults.logging.format),
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first rejected value.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.pipeline.workers == 0 {
            return Err(Error::config("pipeline.workers must be greater than 0"));
        }

        if self.pipeline.channel_buffer_size == 0 {
            return Err(Error::config(
                "pipeline.channel_buffer_size must be greater than 0",
            ));
        }

        if self.fetch.requests_per_second == 0 {
            return Err(Error::config(
                "fetch.requests_per_second must be greater than 0",
            ));
        }

        if self.fetch.request_timeout_secs == 0 {
            return Err(Error::config(
                "fetch.request_timeout_secs must be greater than 0",
            ));
        }

        if self.discovery.feed_paths.iter().any(|p| !p.starts_with('/')) {
            return Err(Error::config(
                "discovery.feed_paths entries must start with '/'",
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(Error::config(format!(
                "logging.level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }

        if !LOG_FORMATS.contains(&self.logging.format.to_ascii_lowercase().as_str()) {
            return Err(Error::config("logging.format must be text or json"));
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.request_timeout_secs)
    }

    /// Get the run timeout, if one is configured
    #[must_use]
    pub fn run_timeout(&self) -> Option<Duration> {
        self.pipeline.run_timeout()
    }
}
