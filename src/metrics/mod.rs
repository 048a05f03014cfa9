//! Prometheus metrics for discovery and ingestion runs
//!
//! Call `init_metrics()` once at startup. If registration fails the record
//! functions become no-ops, so library users and tests never need to set
//! anything up.

use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter,
    CounterVec, Encoder, Gauge, Histogram, TextEncoder,
};
use std::path::Path;
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

struct DiscoveryMetrics {
    candidate_urls: CounterVec,
    failed_probes: CounterVec,
}

struct IngestMetrics {
    runs: Counter,
    url_outcomes: CounterVec,
    run_duration: Histogram,
    last_run_number: Gauge,
    last_batch_size: Gauge,
}

static DISCOVERY_METRICS: OnceLock<DiscoveryMetrics> = OnceLock::new();
static INGEST_METRICS: OnceLock<IngestMetrics> = OnceLock::new();
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

/// Terminal outcome of one URL in a run, used as the `outcome` label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlOutcome {
    Inserted,
    Duplicate,
    FetchFailed,
    Invalid,
    StorageError,
}

impl UrlOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Duplicate => "duplicate",
            Self::FetchFailed => "fetch_failed",
            Self::Invalid => "invalid",
            Self::StorageError => "storage_error",
        }
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Register all metrics with the default registry
///
/// Idempotent: later calls return `Ok(())` without registering again.
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let discovery = DiscoveryMetrics {
        candidate_urls: register_counter_vec!(
            "newsdesk_discovery_candidate_urls_total",
            "Candidate article URLs found per domain",
            &["domain"]
        )?,
        failed_probes: register_counter_vec!(
            "newsdesk_discovery_failed_probes_total",
            "Feed, robots.txt, homepage and sitemap probes that failed",
            &["domain"]
        )?,
    };

    let ingest = IngestMetrics {
        runs: register_counter!("newsdesk_ingest_runs_total", "Completed ingestion runs")?,
        url_outcomes: register_counter_vec!(
            "newsdesk_ingest_urls_total",
            "URLs processed by terminal outcome",
            &["outcome"]
        )?,
        run_duration: register_histogram!(
            "newsdesk_ingest_run_duration_seconds",
            "Wall-clock duration of an ingestion run",
            vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0]
        )?,
        last_run_number: register_gauge!(
            "newsdesk_ingest_last_run_number",
            "Run number of the most recent ingestion run"
        )?,
        last_batch_size: register_gauge!(
            "newsdesk_ingest_last_batch_size",
            "Articles inserted by the most recent ingestion run"
        )?,
    };

    DISCOVERY_METRICS
        .set(discovery)
        .map_err(|_| "Discovery metrics already initialized")?;
    INGEST_METRICS
        .set(ingest)
        .map_err(|_| "Ingest metrics already initialized")?;

    tracing::debug!("Prometheus metrics initialized");
    Ok(())
}

pub fn metrics_initialized() -> bool {
    DISCOVERY_METRICS.get().is_some() && INGEST_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Write the current metrics snapshot to `path` in Prometheus text format,
/// for node_exporter's textfile collector or a later scrape
pub async fn write_metrics(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = encode_metrics()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, text).await?;
    Ok(())
}

/// Record what discovery found on one domain
pub fn record_domain_discovery(domain: &str, urls: usize, failed_probes: usize) {
    let Some(m) = DISCOVERY_METRICS.get() else {
        return;
    };

    if urls > 0 {
        m.candidate_urls
            .with_label_values(&[domain])
            .inc_by(urls as f64);
    }
    if failed_probes > 0 {
        m.failed_probes
            .with_label_values(&[domain])
            .inc_by(failed_probes as f64);
    }
}

/// Record the terminal outcome of one URL
pub fn record_url_outcome(outcome: UrlOutcome) {
    if let Some(m) = INGEST_METRICS.get() {
        m.url_outcomes.with_label_values(&[outcome.as_str()]).inc();
    }
}

/// Record a finished run
pub fn record_run(run_number: i64, inserted: u64, duration_secs: f64) {
    let Some(m) = INGEST_METRICS.get() else {
        return;
    };

    m.runs.inc();
    m.run_duration.observe(duration_secs);
    m.last_run_number.set(run_number as f64);
    m.last_batch_size.set(inserted as f64);
}

// ============================================================================
// Tests
// ============================================================================
