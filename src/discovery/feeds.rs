//! Feed discovery helpers
//!
//! Three sources of feed and sitemap locations per domain:
//! - conventional feed paths, accepted only when the body sniffs as feed markup
//! - `Sitemap:` declarations in robots.txt
//! - `<link type="application/rss+xml">` tags on the homepage
//!
//! Feed bodies are handed to a [`FeedParser`], which returns entry links in
//! feed order.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::utils::error::DiscoveryError;

/// Lowercase tokens that mark a body as RSS/Atom markup
pub const FEED_SNIFF_TOKENS: &[&str] = &["<rss", "<feed", "<atom", "<item>", "<entry>"];

static ROBOTS_SITEMAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*sitemap:\s*(\S+)").unwrap());

static FEED_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"link[type="application/rss+xml"], link[type="application/atom+xml"]"#)
        .unwrap()
});

/// Parses a feed body into its ordered entry links
pub trait FeedParser: Send + Sync {
    /// Entry links in feed order, relative links resolved against `feed_url`
    fn entry_links(&self, body: &[u8], feed_url: &str) -> Result<Vec<String>, DiscoveryError>;
}

/// [`FeedParser`] backed by feed-rs (RSS 0.9x/1.0/2.0, Atom, JSON Feed)
#[derive(Debug, Default, Clone, Copy)]
pub struct FeedRsParser;

impl FeedParser for FeedRsParser {
    fn entry_links(&self, body: &[u8], feed_url: &str) -> Result<Vec<String>, DiscoveryError> {
        let feed =
            feed_rs::parser::parse(body).map_err(|e| DiscoveryError::Feed(e.to_string()))?;
        let base = Url::parse(feed_url).ok();

        let links = feed
            .entries
            .into_iter()
            .filter_map(|entry| {
                // Prefer rel="alternate" (or unlabelled) links over enclosures
                let link = entry
                    .links
                    .iter()
                    .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate"))
                    .or_else(|| entry.links.first())?;
                resolve(base.as_ref(), &link.href)
            })
            .collect();

        Ok(links)
    }
}

/// Lightweight content sniff: does the body contain feed markup?
///
/// A 200 response alone is not enough; soft-404 pages return HTML. The whole
/// body is searched, since comments or stylesheet instructions can push the
/// root element far down.
pub fn looks_like_feed(body: &str) -> bool {
    let lowered = body.to_lowercase();
    FEED_SNIFF_TOKENS.iter().any(|t| lowered.contains(t))
}

/// Sitemap URLs declared in a robots.txt body, resolved against `origin`
pub fn robots_sitemaps(robots: &str, origin: &str) -> Vec<String> {
    let base = Url::parse(origin).ok();
    ROBOTS_SITEMAP
        .captures_iter(robots)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| resolve(base.as_ref(), m.as_str()))
        .collect()
}

/// Feed links advertised by `<link>` tags in homepage HTML
pub fn homepage_feed_links(html: &str, origin: &str) -> Vec<String> {
    let base = Url::parse(origin).ok();
    let document = Html::parse_document(html);

    document
        .select(&FEED_LINK)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| resolve(base.as_ref(), href))
        .collect()
}

/// Resolve `href` against `base`; absolute http(s) links pass through
pub(crate) fn resolve(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let url = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };

    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}
