//! Candidate URL discovery
//!
//! For every root domain the engine probes conventional feed paths, robots.txt
//! sitemap declarations, homepage feed links and the default sitemap
//! locations. Each probe is isolated: a failure is logged and contributes no
//! URLs. The result is the union over all domains, deduplicated by exact URL.

pub mod classify;
pub mod feeds;
pub mod handoff;
pub mod sitemap;

pub use classify::UrlClassifier;
pub use feeds::{FeedParser, FeedRsParser};
pub use handoff::{read_url_file, write_url_file};
pub use sitemap::{SitemapSource, XmlSitemapSource};

use futures::stream::{self, StreamExt};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::config::DiscoveryConfig;
use crate::crawler::Fetcher;
use crate::metrics;
use crate::utils::domain_origin;

/// Sitemap locations tried on every domain in addition to robots.txt entries
pub const DEFAULT_SITEMAP_PATHS: &[&str] = &["/sitemap.xml", "/sitemap_index.xml"];

/// Domains processed at the same time
const DOMAIN_CONCURRENCY: usize = 4;

/// What discovery found on one domain
#[derive(Debug, Clone, Default)]
pub struct DomainReport {
    pub domain: String,
    /// Feeds that passed the content sniff or were advertised by the homepage
    pub feeds: Vec<String>,
    /// Sitemap roots that were walked
    pub sitemaps: Vec<String>,
    /// Candidate URLs in discovery order, deduplicated
    pub urls: Vec<String>,
    /// Probes that failed and were skipped
    pub failed_probes: usize,
}

/// Produces the candidate URL set for a run
pub struct DiscoveryEngine {
    fetcher: Arc<Fetcher>,
    feed_parser: Arc<dyn FeedParser>,
    sitemaps: Arc<dyn SitemapSource>,
    classifier: UrlClassifier,
    config: DiscoveryConfig,
}

impl DiscoveryEngine {
    /// Engine with the feed-rs parser and the XML sitemap walker
    pub fn new(config: DiscoveryConfig, fetcher: Arc<Fetcher>) -> Self {
        let sitemaps = Arc::new(XmlSitemapSource::new(
            Arc::clone(&fetcher),
            config.max_sitemap_depth,
        ));
        Self::with_components(config, fetcher, Arc::new(FeedRsParser), sitemaps)
    }

    /// Engine with explicit feed and sitemap collaborators
    pub fn with_components(
        config: DiscoveryConfig,
        fetcher: Arc<Fetcher>,
        feed_parser: Arc<dyn FeedParser>,
        sitemaps: Arc<dyn SitemapSource>,
    ) -> Self {
        Self {
            fetcher,
            feed_parser,
            sitemaps,
            classifier: UrlClassifier::new(),
            config,
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Discover candidate URLs across all domains
    pub async fn discover(&self, domains: &[String]) -> BTreeSet<String> {
        let reports: Vec<DomainReport> = stream::iter(domains)
            .map(|domain| self.discover_domain(domain))
            .buffer_unordered(DOMAIN_CONCURRENCY)
            .collect()
            .await;

        let urls: BTreeSet<String> = reports.into_iter().flat_map(|r| r.urls).collect();
        tracing::info!(domains = domains.len(), urls = urls.len(), "Discovery finished");
        urls
    }

    /// Discover candidate URLs on a single domain
    pub async fn discover_domain(&self, domain: &str) -> DomainReport {
        let mut report = DomainReport {
            domain: domain.to_string(),
            ..Default::default()
        };

        let origin = match domain_origin(domain) {
            Ok(origin) => origin,
            Err(e) => {
                tracing::warn!(domain, error = %e, "Skipping invalid domain");
                report.failed_probes += 1;
                return report;
            }
        };

        tracing::info!(domain, origin = %origin, "Discovering");

        let probed = self.probe_feed_paths(&origin, &mut report).await;
        let mut advertised = Vec::new();
        let mut sitemap_roots = Vec::new();

        match self.fetcher.fetch_text(&format!("{origin}/robots.txt")).await {
            Ok(robots) => sitemap_roots.extend(feeds::robots_sitemaps(&robots, &origin)),
            Err(e) => {
                tracing::warn!(domain, error = %e, "robots.txt probe failed");
                report.failed_probes += 1;
            }
        }

        match self.fetcher.fetch_text(&origin).await {
            Ok(html) => advertised.extend(feeds::homepage_feed_links(&html, &origin)),
            Err(e) => {
                tracing::warn!(domain, error = %e, "Homepage probe failed");
                report.failed_probes += 1;
            }
        }

        sitemap_roots.extend(DEFAULT_SITEMAP_PATHS.iter().map(|p| format!("{origin}{p}")));
        report.sitemaps = dedup_in_order(sitemap_roots, &mut HashSet::new());

        let mut seen = HashSet::new();
        let mut feed_seen = HashSet::new();

        // Probed feeds are parsed from the body the sniff already fetched
        for (feed_url, body) in probed {
            if !feed_seen.insert(feed_url.clone()) {
                continue;
            }
            let links = self.feed_entries(&feed_url, &body, &mut report);
            report.feeds.push(feed_url);
            push_unique(&mut report.urls, &mut seen, links);
        }

        for feed_url in advertised {
            if !feed_seen.insert(feed_url.clone()) {
                continue;
            }
            let links = match self.fetcher.fetch_text(&feed_url).await {
                Ok(body) => self.feed_entries(&feed_url, &body, &mut report),
                Err(e) => {
                    tracing::warn!(feed = %feed_url, error = %e, "Feed fetch failed");
                    report.failed_probes += 1;
                    Vec::new()
                }
            };
            report.feeds.push(feed_url);
            push_unique(&mut report.urls, &mut seen, links);
        }

        let accepted = self.sitemap_articles(&mut report).await;
        push_unique(&mut report.urls, &mut seen, accepted);

        tracing::info!(
            domain,
            feeds = report.feeds.len(),
            sitemaps = report.sitemaps.len(),
            urls = report.urls.len(),
            failed_probes = report.failed_probes,
            "Domain discovered"
        );
        metrics::record_domain_discovery(domain, report.urls.len(), report.failed_probes);

        report
    }

    /// Feed paths whose body sniffs as RSS/Atom markup, with that body
    async fn probe_feed_paths(
        &self,
        origin: &str,
        report: &mut DomainReport,
    ) -> Vec<(String, String)> {
        let mut found = Vec::new();

        for path in &self.config.feed_paths {
            let url = format!("{origin}{path}");
            match self.fetcher.fetch_text(&url).await {
                Ok(body) if feeds::looks_like_feed(&body) => {
                    tracing::debug!(feed = %url, "Feed found");
                    found.push((url, body));
                }
                Ok(_) => tracing::debug!(url = %url, "Not a feed"),
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "Feed probe failed");
                    report.failed_probes += 1;
                }
            }
        }

        found
    }

    /// Entry links of one feed body, capped at `feed_entry_cap`
    fn feed_entries(&self, feed_url: &str, body: &str, report: &mut DomainReport) -> Vec<String> {
        match self.feed_parser.entry_links(body.as_bytes(), feed_url) {
            Ok(mut links) => {
                links.truncate(self.config.feed_entry_cap);
                links
            }
            Err(e) => {
                tracing::warn!(feed = %feed_url, error = %e, "Feed parse failed");
                report.failed_probes += 1;
                Vec::new()
            }
        }
    }

    /// Classified sitemap URLs across all roots, capped at `sitemap_url_cap`
    ///
    /// Each root is asked only for the URLs still missing, so no sitemap is
    /// fetched once the cap is reached.
    async fn sitemap_articles(&self, report: &mut DomainReport) -> Vec<String> {
        let mut accepted: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for root in report.sitemaps.clone() {
            let remaining = self.config.sitemap_url_cap.saturating_sub(accepted.len());
            if remaining == 0 {
                break;
            }

            let result = {
                let classifier = &self.classifier;
                let already = &seen;
                let accept = |url: &str| classifier.is_article_url(url) && !already.contains(url);
                self.sitemaps.urls(&root, &accept, remaining).await
            };

            match result {
                Ok(urls) => {
                    for url in urls {
                        if seen.insert(url.clone()) {
                            accepted.push(url);
                        }
                    }
                }
                Err(e) => {
                    tracing::debug!(sitemap = %root, error = %e, "Sitemap probe failed");
                    report.failed_probes += 1;
                }
            }
        }

        accepted
    }
}

fn dedup_in_order(items: Vec<String>, seen: &mut HashSet<String>) -> Vec<String> {
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

fn push_unique(target: &mut Vec<String>, seen: &mut HashSet<String>, items: Vec<String>) {
    target.extend(dedup_in_order(items, seen));
}
