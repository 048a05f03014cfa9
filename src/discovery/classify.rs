//! Heuristic article URL classifier
//!
//! A URL is kept when its path looks like an article (known section pattern or
//! a year segment) and matches no exclusion (listing pages, static assets).
//! Each URL is judged on its own; the classifier holds no state between calls.

use regex::Regex;
use url::Url;

/// Path fragments that mark an article page
pub const ARTICLE_PATTERNS: &[&str] = &[
    "/news/",
    "/article/",
    "/story/",
    "/post/",
    "/blog/",
    "/press-release/",
    "/announcement/",
    "/update/",
];

/// Path fragments that mark listing or non-article pages
pub const EXCLUDED_PATTERNS: &[&str] = &[
    "/category/",
    "/tag/",
    "/author/",
    "/search/",
    "/page/",
    "/contact/",
    "/about/",
    "/privacy/",
    "/terms/",
];

/// File extensions that are never article pages
pub const EXCLUDED_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".css", ".js", ".xml", ".zip",
    ".mp3", ".mp4",
];

/// Article URL classifier
#[derive(Debug, Clone)]
pub struct UrlClassifier {
    /// Matches a year-like path segment: /2024/
    year_pattern: Regex,
    /// Matches pagination query parameters: ?page=2
    pagination_pattern: Regex,
}

impl UrlClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            year_pattern: Regex::new(r"/20\d{2}/").unwrap(),
            pagination_pattern: Regex::new(r"(?i)[?&]page=\d+").unwrap(),
        }
    }

    /// Check whether a URL looks like an article page
    ///
    /// # Examples
    ///
    /// ```
    /// use newsdesk::discovery::UrlClassifier;
    ///
    /// let classifier = UrlClassifier::new();
    /// assert!(classifier.is_article_url("https://example.com/news/2024/story/42"));
    /// assert!(!classifier.is_article_url("https://example.com/category/sports"));
    /// ```
    pub fn is_article_url(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return false;
        }

        let path = parsed.path().to_ascii_lowercase();
        // Trailing slash lets "/about" style endings match the exclusion "/about/"
        let path_slashed = if path.ends_with('/') {
            path.clone()
        } else {
            format!("{path}/")
        };

        if self.is_excluded(&path, &path_slashed, parsed.query()) {
            return false;
        }

        ARTICLE_PATTERNS.iter().any(|p| path.contains(p)) || self.year_pattern.is_match(&path)
    }

    fn is_excluded(&self, path: &str, path_slashed: &str, query: Option<&str>) -> bool {
        if EXCLUDED_PATTERNS.iter().any(|p| path_slashed.contains(p)) {
            return true;
        }

        if EXCLUDED_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            return true;
        }

        query
            .map(|q| self.pagination_pattern.is_match(&format!("?{q}")))
            .unwrap_or(false)
    }
}

impl Default for UrlClassifier {
    fn default() -> Self {
        Self::new()
    }
}
