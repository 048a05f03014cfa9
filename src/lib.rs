//! newsdesk - multi-source news ingestion
//!
//! Discovers candidate article URLs from feeds and sitemaps, extracts
//! normalized fields from heterogeneous article markup, and persists each URL
//! at most once, grouped into numbered batches.
//!
//! # Architecture
//!
//! - [`config`] - Configuration object threaded into every component
//! - [`crawler`] - HTTP fetcher with header rotation and rate limiting
//! - [`discovery`] - Feed, robots.txt, homepage and sitemap discovery
//! - [`sources`] - Domain to source identity and date strategy chains
//! - [`parser`] - Field extractors built on ordered strategy chains
//! - [`pipeline`] - Batch-tracked fetch → extract → persist runs
//! - [`storage`] - Article repository with a unique URL constraint
//! - [`models`] - Records, batches and run summaries
//! - [`metrics`] - Prometheus counters for discovery and ingestion
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use newsdesk::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let fetcher = Arc::new(Fetcher::new(&config.fetch)?);
//!
//!     let engine = DiscoveryEngine::new(config.discovery.clone(), Arc::clone(&fetcher));
//!     let urls = engine.discover(&config.discovery.domains).await;
//!
//!     let repository = newsdesk::storage::open_repository(&config.database)?;
//!     let pipeline = IngestionPipeline::new(
//!         config.pipeline.clone(),
//!         fetcher,
//!         Arc::new(ArticleExtractor::default()),
//!         repository,
//!     );
//!     let summary = pipeline.run(urls.into_iter().collect()).await?;
//!     println!("run {} stored {}", summary.batch.run_number, summary.inserted);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod discovery;
pub mod error;
pub mod metrics;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod sources;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::Fetcher;
    pub use crate::discovery::{DiscoveryEngine, UrlClassifier};
    pub use crate::error::{Error, Result};
    pub use crate::models::{ArticleRecord, BatchInfo, ExtractedArticle, InsertOutcome, RunSummary};
    pub use crate::parser::ArticleExtractor;
    pub use crate::pipeline::IngestionPipeline;
    pub use crate::sources::SourceRegistry;
    pub use crate::storage::{ArticleRepository, SharedArticleRepository};
}

pub use models::{ArticleRecord, BatchInfo, RunSummary};
