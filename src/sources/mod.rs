//! Source adapter registry
//!
//! Maps a URL's host to a source name and that source's date strategy chain.
//! The chain is a hint: the generic chain always runs after it.

use chrono::{DateTime, Utc};
use url::{Host, Url};

use crate::parser::accept_date;
use crate::parser::selectors::GENERIC_DATE;
use crate::parser::strategy::{Strategy, StrategyChain};
use crate::utils::title_case;
use crate::{attr_strategy, text_strategy};

/// Name returned when the host cannot be determined
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Static domain → name table for known outlets
pub const KNOWN_SOURCES: &[(&str, &[&str])] = &[
    ("BBC", &["bbc.com", "bbc.co.uk"]),
    ("CNN", &["cnn.com"]),
    ("Guardian", &["theguardian.com"]),
    ("Reuters", &["reuters.com"]),
    ("AP News", &["apnews.com"]),
    ("NPR", &["npr.org"]),
    ("TechCrunch", &["techcrunch.com"]),
    ("New York Times", &["nytimes.com"]),
    ("Washington Post", &["washingtonpost.com"]),
    ("Bloomberg", &["bloomberg.com"]),
    ("CBS News", &["cbsnews.com"]),
    ("NBC News", &["nbcnews.com"]),
    ("ABC News", &["abcnews.go.com"]),
    ("Sky News", &["news.sky.com"]),
    ("Al Jazeera", &["aljazeera.com"]),
    ("Ars Technica", &["arstechnica.com"]),
    ("Yahoo Finance", &["finance.yahoo.com"]),
    ("Test", &["test.com", "example.com"]),
];

type DateChain = StrategyChain<DateTime<Utc>>;

/// Identity and date strategy chain for one outlet
pub struct SourceAdapter {
    pub name: String,
    pub domains: Vec<String>,
    date_chain: Option<DateChain>,
}

impl SourceAdapter {
    pub fn new(name: impl Into<String>, domains: &[&str]) -> Self {
        Self {
            name: name.into(),
            domains: domains.iter().map(|d| d.to_ascii_lowercase()).collect(),
            date_chain: None,
        }
    }

    pub fn with_date_chain(mut self, chain: DateChain) -> Self {
        self.date_chain = Some(chain);
        self
    }

    fn matches_exact(&self, host: &str) -> bool {
        self.domains
            .iter()
            .any(|d| host == d || host.ends_with(&format!(".{d}")))
    }

    fn matches_substring(&self, host: &str) -> bool {
        self.domains.iter().any(|d| host.contains(d.as_str()))
    }
}

/// Registry of known outlets
pub struct SourceRegistry {
    adapters: Vec<SourceAdapter>,
}

impl SourceRegistry {
    /// Empty registry; every URL resolves through the label fallback
    pub fn empty() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    /// Registry with the built-in outlet table and their date chains
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for (name, domains) in KNOWN_SOURCES {
            let adapter = SourceAdapter::new(*name, domains);
            let adapter = match builtin_date_chain(name) {
                Some(chain) => adapter.with_date_chain(chain),
                None => adapter,
            };
            registry.register(adapter);
        }
        registry
    }

    /// Add an outlet; later registrations lose to earlier ones on overlap
    pub fn register(&mut self, adapter: SourceAdapter) {
        self.adapters.push(adapter);
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Resolve the source name for a URL
    ///
    /// 1. Host equals a known domain or is a subdomain of one
    /// 2. Host contains a known domain as a substring
    /// 3. Second-to-last host label, title-cased
    /// 4. `"Unknown"` for unparseable URLs and IP hosts
    pub fn identify(&self, url: &str) -> String {
        let Some(host) = Url::parse(url).ok().and_then(|u| match u.host() {
            Some(Host::Domain(d)) => Some(d.to_ascii_lowercase()),
            _ => None,
        }) else {
            return UNKNOWN_SOURCE.to_string();
        };

        if let Some(adapter) = self.adapters.iter().find(|a| a.matches_exact(&host)) {
            return adapter.name.clone();
        }

        if let Some(adapter) = self.adapters.iter().find(|a| a.matches_substring(&host)) {
            return adapter.name.clone();
        }

        label_name(&host).unwrap_or_else(|| UNKNOWN_SOURCE.to_string())
    }

    /// Source-specific chain for a source name, if one is registered
    pub fn date_chain(&self, source: &str) -> Option<&DateChain> {
        self.adapters
            .iter()
            .find(|a| a.name == source)
            .and_then(|a| a.date_chain.as_ref())
    }

    /// Chains to try in order: source-specific (if any), then generic
    pub fn date_chains(&self, source: &str) -> Vec<&DateChain> {
        let mut chains = Vec::with_capacity(2);
        if let Some(chain) = self.date_chain(source) {
            chains.push(chain);
        }
        chains.push(&*GENERIC_DATE);
        chains
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn label_name(host: &str) -> Option<String> {
    let labels: Vec<&str> = host
        .trim_end_matches('.')
        .split('.')
        .filter(|l| !l.is_empty())
        .collect();

    let label = match labels.len() {
        0 => return None,
        1 => labels[0],
        n => labels[n - 2],
    };

    Some(title_case(label))
}

/// Per-outlet date strategies
fn builtin_date_chain(source: &str) -> Option<DateChain> {
    let strategies: Vec<Strategy<DateTime<Utc>>> = match source {
        "BBC" => vec![
            attr_strategy!(r#"time[data-testid="timestamp"]"#, "datetime", accept_date),
            attr_strategy!(r#"[data-testid="timestamp"] time"#, "datetime", accept_date),
            attr_strategy!(".date[data-seconds]", "data-seconds", accept_date),
        ],
        "CNN" => vec![
            attr_strategy!(r#"meta[name="pubdate"]"#, "content", accept_date),
            text_strategy!(".timestamp", accept_date),
            text_strategy!(".update-time", accept_date),
        ],
        "Guardian" => vec![
            attr_strategy!(r#"time[itemprop="datePublished"]"#, "datetime", accept_date),
            attr_strategy!(r#"[data-gu-name="meta"] time"#, "datetime", accept_date),
            text_strategy!(r#"[data-gu-name="meta"] summary"#, accept_date),
        ],
        "Reuters" => vec![
            attr_strategy!(r#"meta[name="article:published_time"]"#, "content", accept_date),
            text_strategy!(r#"[data-testid="DateLineText"]"#, accept_date),
            attr_strategy!("time[datetime]", "datetime", accept_date),
        ],
        "AP News" => vec![
            attr_strategy!("bsp-timestamp[data-timestamp]", "data-timestamp", accept_date),
            attr_strategy!(r#"[data-key="timestamp"]"#, "data-source", accept_date),
            attr_strategy!(".Page-dateModified [data-date]", "data-date", accept_date),
        ],
        "NPR" => vec![
            attr_strategy!(".dateblock time", "datetime", accept_date),
            attr_strategy!(r#"meta[name="date"]"#, "content", accept_date),
        ],
        "TechCrunch" => vec![
            attr_strategy!(".wp-block-post-date time", "datetime", accept_date),
            attr_strategy!("time.full-date-time", "datetime", accept_date),
        ],
        "New York Times" => vec![
            attr_strategy!(r#"meta[property="article:published_time"]"#, "content", accept_date),
            attr_strategy!("time[datetime]", "datetime", accept_date),
        ],
        "Washington Post" => vec![
            attr_strategy!(r#"[data-testid="display-date"]"#, "datetime", accept_date),
            text_strategy!(r#"[data-testid="display-date"]"#, accept_date),
        ],
        _ => return None,
    };

    Some(StrategyChain::new(strategies))
}
