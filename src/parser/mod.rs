//! HTML field extraction
//!
//! [`ArticleExtractor`] runs every field extractor over one fetched document.
//! Extraction never fails: each field resolves through its strategy chain and
//! then a terminal fallback (synthetic title, absent date, absent optional
//! field, or the content failure marker).

pub mod date;
pub mod sanitize;
pub mod selectors;
pub mod strategy;

pub use date::parse_date;
pub use strategy::{Locator, ParagraphChain, Strategy, StrategyChain};

use chrono::{DateTime, Utc};
use scraper::Html;
use std::sync::Arc;

use crate::models::ExtractedArticle;
use crate::sources::{SourceRegistry, UNKNOWN_SOURCE};
use crate::utils::{title_case, truncate_chars};
use sanitize::{
    clean_text, has_content, strip_byline_prefix, strip_named_suffix, strip_site_suffix,
};
use selectors::URL_CATEGORY_KEYWORDS;

/// Titles must be longer than this many characters
pub const TITLE_MIN_CHARS: usize = 10;

/// Authors must be longer than this many characters
pub const AUTHOR_MIN_CHARS: usize = 2;

/// Categories longer than this are treated as page chrome, not a section name
pub const CATEGORY_MAX_CHARS: usize = 50;

pub const SUMMARY_MAX_PARAGRAPHS: usize = 3;
pub const SUMMARY_MAX_CHARS: usize = 500;
pub const SUMMARY_ELLIPSIS: &str = "...";

pub const CONTENT_MAX_PARAGRAPHS: usize = 10;
pub const CONTENT_MAX_CHARS: usize = 10_000;
pub const CONTENT_TRUNCATION_MARKER: &str = "\n\n[Content truncated]";

/// Stored in `content` when no qualifying paragraph exists
pub const CONTENT_FAILURE_MARKER: &str = "Content extraction failed";

/// Synthetic title used when no title strategy matches
pub fn default_title(url: &str) -> String {
    format!("Article from {url}")
}

// ============================================================================
// Acceptors
// ============================================================================

/// Accept a title candidate longer than [`TITLE_MIN_CHARS`]
pub fn accept_title(raw: &str) -> Option<String> {
    let cleaned = clean_text(raw);
    (has_content(&cleaned) && cleaned.chars().count() > TITLE_MIN_CHARS).then_some(cleaned)
}

/// Like [`accept_title`], preferring the `<title>` text without its site suffix
pub fn accept_page_title(raw: &str) -> Option<String> {
    accept_title(&strip_site_suffix(&clean_text(raw))).or_else(|| accept_title(raw))
}

/// Accept a site name as published, without length limits
pub fn accept_site_name(raw: &str) -> Option<String> {
    let cleaned = clean_text(raw);
    has_content(&cleaned).then_some(cleaned)
}

pub fn accept_date(raw: &str) -> Option<DateTime<Utc>> {
    parse_date(&clean_text(raw))
}

/// Accept an author after stripping a "by "/"author:" prefix
///
/// Profile links (`article:author` often holds a URL) are rejected.
pub fn accept_author(raw: &str) -> Option<String> {
    let name = strip_byline_prefix(&clean_text(raw));
    if name.starts_with("http://") || name.starts_with("https://") {
        return None;
    }
    (has_content(&name) && name.chars().count() > AUTHOR_MIN_CHARS).then_some(name)
}

/// Accept a section name, title-cased
pub fn accept_category(raw: &str) -> Option<String> {
    let cleaned = clean_text(raw);
    let len = cleaned.chars().count();
    if !has_content(&cleaned) || len > CATEGORY_MAX_CHARS || cleaned.eq_ignore_ascii_case("home") {
        return None;
    }
    Some(title_case(&cleaned))
}

/// Category from the first URL path segment naming a known section
///
/// A segment matches a keyword exactly or in its plural form; `technology`
/// also counts as `tech`.
pub fn category_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segments = parsed.path_segments()?;

    for segment in segments {
        let segment = segment.to_ascii_lowercase();
        let hit = URL_CATEGORY_KEYWORDS.iter().find(|kw| {
            segment == **kw
                || segment.strip_suffix('s') == Some(**kw)
                || (**kw == "tech" && segment == "technology")
        });
        if let Some(kw) = hit {
            return Some(title_case(kw));
        }
    }

    None
}

// ============================================================================
// Extractor
// ============================================================================

/// Runs every field extractor against a fetched document
#[derive(Clone)]
pub struct ArticleExtractor {
    registry: Arc<SourceRegistry>,
}

impl ArticleExtractor {
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Extract all fields from `html` fetched from `url`
    pub fn extract(&self, url: &str, html: &str) -> ExtractedArticle {
        let document = Html::parse_document(html);
        let source = self.registry.identify(url);

        let publication_date = self.extract_date(&document, &source);
        if publication_date.is_none() {
            tracing::debug!(url, source = %source, "No publication date found");
        }

        let title = drop_site_name(extract_title(&document, url), &document, &source);

        ExtractedArticle {
            title,
            publication_date,
            summary: extract_summary(&document),
            content: Some(extract_content(&document)),
            author: extract_author(&document),
            category: extract_category(&document, url),
            source,
        }
    }

    /// Source-specific chain first, then the generic chain
    pub fn extract_date(&self, document: &Html, source: &str) -> Option<DateTime<Utc>> {
        strategy::resolve_chains(&self.registry.date_chains(source), document)
    }
}

impl Default for ArticleExtractor {
    fn default() -> Self {
        Self::new(Arc::new(SourceRegistry::default()))
    }
}

/// Title with the URL-derived default when nothing matches
pub fn extract_title(document: &Html, url: &str) -> String {
    selectors::TITLE
        .resolve(document)
        .unwrap_or_else(|| default_title(url))
}

/// Remove a " - Site Name" tail naming the source or the page's `og:site_name`
///
/// The title is kept as-is when what remains would no longer be accepted.
pub fn drop_site_name(title: String, document: &Html, source: &str) -> String {
    let site_name = selectors::SITE_NAME.resolve(document);
    let mut names = vec![site_name.as_deref().unwrap_or_default()];
    if source != UNKNOWN_SOURCE {
        names.push(source);
    }

    let stripped = strip_named_suffix(&title, &names);
    if stripped != title && accept_title(&stripped).is_some() {
        stripped
    } else {
        title
    }
}

pub fn extract_author(document: &Html) -> Option<String> {
    selectors::AUTHOR.resolve(document)
}

/// Markup strategies first, then the URL path vocabulary
pub fn extract_category(document: &Html, url: &str) -> Option<String> {
    selectors::CATEGORY
        .resolve(document)
        .or_else(|| category_from_url(url))
}

/// First three qualifying paragraphs joined by a space, capped at 500 characters
pub fn extract_summary(document: &Html) -> Option<String> {
    let paragraphs = selectors::SUMMARY.collect(document, SUMMARY_MAX_PARAGRAPHS)?;
    let joined = paragraphs.join(" ");
    Some(truncate_chars(&joined, SUMMARY_MAX_CHARS, SUMMARY_ELLIPSIS))
}

/// Up to ten qualifying paragraphs separated by blank lines, or the failure marker
pub fn extract_content(document: &Html) -> String {
    match selectors::CONTENT.collect(document, CONTENT_MAX_PARAGRAPHS) {
        Some(paragraphs) => truncate_chars(
            &paragraphs.join("\n\n"),
            CONTENT_MAX_CHARS,
            CONTENT_TRUNCATION_MARKER,
        ),
        None => CONTENT_FAILURE_MARKER.to_string(),
    }
}
