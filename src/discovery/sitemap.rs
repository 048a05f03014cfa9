//! Sitemap tree walking
//!
//! A [`SitemapSource`] turns one sitemap location into the page URLs listed
//! under it, following `<sitemapindex>` children up to a depth limit.

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::crawler::Fetcher;
use crate::utils::error::DiscoveryError;

/// Upper bound on raw entries inspected in one sitemap tree
pub const MAX_SITEMAP_ENTRIES: usize = 5_000;

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<sitemapindex>`: locations of child sitemaps
    Index(Vec<String>),
    /// `<urlset>`: page locations
    UrlSet(Vec<String>),
}

/// Produces page URLs from a sitemap location
#[async_trait]
pub trait SitemapSource: Send + Sync {
    /// Page URLs under the sitemap at `sitemap_url` that pass `accept`, in
    /// document order
    ///
    /// The walk stops fetching as soon as `limit` URLs have been accepted.
    async fn urls(
        &self,
        sitemap_url: &str,
        accept: &(dyn for<'s> Fn(&'s str) -> bool + Sync),
        limit: usize,
    ) -> Result<Vec<String>, DiscoveryError>;
}

/// [`SitemapSource`] that fetches XML sitemaps and parses them with quick-xml
pub struct XmlSitemapSource {
    fetcher: Arc<Fetcher>,
    max_depth: usize,
}

impl XmlSitemapSource {
    pub fn new(fetcher: Arc<Fetcher>, max_depth: usize) -> Self {
        Self { fetcher, max_depth }
    }
}

#[async_trait]
impl SitemapSource for XmlSitemapSource {
    async fn urls(
        &self,
        sitemap_url: &str,
        accept: &(dyn for<'s> Fn(&'s str) -> bool + Sync),
        limit: usize,
    ) -> Result<Vec<String>, DiscoveryError> {
        let mut queue = VecDeque::from([(sitemap_url.to_string(), 0usize)]);
        let mut visited = HashSet::new();
        let mut accepted = Vec::new();
        let mut seen = HashSet::new();
        let mut inspected = 0usize;

        while let Some((location, depth)) = queue.pop_front() {
            if accepted.len() >= limit || inspected >= MAX_SITEMAP_ENTRIES {
                tracing::debug!(
                    sitemap = %sitemap_url,
                    accepted = accepted.len(),
                    inspected,
                    pending = queue.len() + 1,
                    "Sitemap walk stopped early"
                );
                break;
            }
            if !visited.insert(location.clone()) {
                continue;
            }

            let parsed = match self.fetcher.fetch_text(&location).await {
                Ok(body) => parse_sitemap(&body),
                Err(e) => Err(DiscoveryError::Fetch(e)),
            };

            let document = match parsed {
                Ok(document) => document,
                // The root failing is the caller's problem; a broken child is skipped
                Err(e) if depth == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!(sitemap = %location, error = %e, "Skipping child sitemap");
                    continue;
                }
            };

            match document {
                SitemapDocument::Index(children) => {
                    if depth >= self.max_depth {
                        tracing::debug!(sitemap = %location, depth, "Sitemap index depth limit reached");
                        continue;
                    }
                    queue.extend(children.into_iter().map(|child| (child, depth + 1)));
                }
                SitemapDocument::UrlSet(locs) => {
                    for loc in locs {
                        if accepted.len() >= limit || inspected >= MAX_SITEMAP_ENTRIES {
                            break;
                        }
                        inspected += 1;
                        if accept(&loc) && seen.insert(loc.clone()) {
                            accepted.push(loc);
                        }
                    }
                }
            }
        }

        Ok(accepted)
    }
}

/// Parse a sitemap or sitemap index
///
/// # Errors
///
/// Returns `DiscoveryError::Sitemap` for malformed XML or when the root
/// element is neither `<urlset>` nor `<sitemapindex>`.
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, DiscoveryError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut is_index: Option<bool> = None;
    let mut in_loc = false;
    let mut locs = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"sitemapindex" if is_index.is_none() => is_index = Some(true),
                b"urlset" if is_index.is_none() => is_index = Some(false),
                b"loc" => in_loc = true,
                _ => {}
            },
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"loc" {
                    in_loc = false;
                }
            }
            Ok(Event::Text(t)) if in_loc => {
                let text = t
                    .unescape()
                    .map_err(|e| DiscoveryError::Sitemap(e.to_string()))?;
                push_loc(&mut locs, &text);
            }
            Ok(Event::CData(c)) if in_loc => {
                push_loc(&mut locs, &String::from_utf8_lossy(&c.into_inner()));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DiscoveryError::Sitemap(format!(
                    "at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    match is_index {
        Some(true) => Ok(SitemapDocument::Index(locs)),
        Some(false) => Ok(SitemapDocument::UrlSet(locs)),
        None => Err(DiscoveryError::Sitemap(
            "root element is not <urlset> or <sitemapindex>".to_string(),
        )),
    }
}

fn push_loc(locs: &mut Vec<String>, text: &str) {
    let loc = text.trim();
    if !loc.is_empty() {
        locs.push(loc.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/news/a</loc><lastmod>2024-03-05</lastmod></url>
  <url><loc> https://example.com/news/b?x=1&amp;y=2 </loc></url>
</urlset>"#;

        assert_eq!(
            parse_sitemap(xml).unwrap(),
            SitemapDocument::UrlSet(vec![
                "https://example.com/news/a".into(),
                "https://example.com/news/b?x=1&y=2".into(),
            ])
        );
    }

    #[test]
    fn test_parse_index_with_cdata() {
        let xml = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc><![CDATA[https://example.com/sitemap-news.xml]]></loc></sitemap>
</sitemapindex>"#;

        assert_eq!(
            parse_sitemap(xml).unwrap(),
            SitemapDocument::Index(vec!["https://example.com/sitemap-news.xml".into()])
        );
    }

    #[test]
    fn test_parse_namespaced_prefix() {
        let xml = r#"<sm:urlset xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sm:url><sm:loc>https://example.com/story/1</sm:loc></sm:url>
</sm:urlset>"#;

        assert_eq!(
            parse_sitemap(xml).unwrap(),
            SitemapDocument::UrlSet(vec!["https://example.com/story/1".into()])
        );
    }

    #[test]
    fn test_parse_rejects_html() {
        let err = parse_sitemap("<html><body>404</body></html>").unwrap_err();
        assert!(matches!(err, DiscoveryError::Sitemap(_)));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_sitemap("<urlset><url><loc>https://x.com</url></urlset>").is_err());
    }
}
