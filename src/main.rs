use anyhow::Result;
use clap::{Parser, Subcommand};
use newsdesk::config::LoggingConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(
    name = "newsdesk",
    version,
    about = "News ingestion pipeline: feed/sitemap discovery, field extraction, batch-tracked storage",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Write Prometheus metrics to this file when the command finishes
    #[arg(long, global = true)]
    metrics_file: Option<PathBuf>,

    /// TOML configuration file (environment variables are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover candidate article URLs and write them to a file
    Discover {
        /// Root domain to probe (repeatable; overrides configured domains)
        #[arg(short, long = "domain")]
        domains: Vec<String>,

        /// Output file for the URL list
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Ingest URLs from a discovery file as one batch
    Ingest {
        /// URL list produced by `discover`
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Maximum URLs to ingest (0 = unlimited)
        #[arg(short, long)]
        max_urls: Option<usize>,
    },

    /// Discover and ingest in one run
    Run {
        /// Root domain to probe (repeatable; overrides configured domains)
        #[arg(short, long = "domain")]
        domains: Vec<String>,

        /// Maximum URLs to ingest (0 = unlimited)
        #[arg(short, long)]
        max_urls: Option<usize>,
    },

    /// Show stored article and batch statistics
    Stats {
        /// Number of recent batches to list
        #[arg(short, long, default_value = "10")]
        batches: usize,

        /// Print as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = commands::load_config(cli.config.as_deref())?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    setup_tracing(&config.logging, cli.verbose)?;

    if let Err(e) = newsdesk::metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics initialization failed");
    }

    match cli.command {
        Commands::Discover { domains, output } => {
            tracing::info!(domains = ?domains, output = ?output, "Starting discover command");
            commands::discover(&config, domains, output).await?;
        }

        Commands::Ingest { input, max_urls } => {
            tracing::info!(input = ?input, max_urls = ?max_urls, "Starting ingest command");
            commands::ingest(&config, input, max_urls).await?;
        }

        Commands::Run { domains, max_urls } => {
            tracing::info!(domains = ?domains, max_urls = ?max_urls, "Starting run command");
            commands::run(&config, domains, max_urls).await?;
        }

        Commands::Stats { batches, json } => {
            commands::stats(&config, batches, json)?;
        }
    }

    if let Some(path) = cli.metrics_file {
        newsdesk::metrics::write_metrics(&path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write metrics to {}: {e}", path.display()))?;
        tracing::info!(path = %path.display(), "Metrics written");
    }

    Ok(())
}

fn setup_tracing(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(logging.filter_directive(verbose)));

    if logging.is_json() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    Ok(())
}
