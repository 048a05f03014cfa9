//! Text sanitization for extracted field values
//!
//! Scraped values are cleaned before validation: invisible characters and
//! control characters are removed, leftover entities decoded, and whitespace
//! collapsed to single spaces.

use regex::Regex;
use std::sync::LazyLock;

use crate::utils::normalize_whitespace;

static BYLINE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:by\s+|author\s*:\s*)").unwrap());

static PIPE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\|\s+[^|]{2,40}$").unwrap());

static DASH_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[\-–—]\s+([^\-–—]{2,40})$").unwrap());

/// Clean a single-line value
///
/// # Examples
///
/// ```
/// use newsdesk::parser::sanitize::clean_text;
///
/// assert_eq!(clean_text("  Rates\u{200B} rise &amp; fall\n"), "Rates rise & fall");
/// ```
pub fn clean_text(text: &str) -> String {
    let text = remove_zero_width(text);
    let text = remove_control_chars(&text);
    let text = html_escape::decode_html_entities(&text);
    normalize_whitespace(&text)
}

/// Remove zero-width spaces and similar invisible characters
pub fn remove_zero_width(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(*c,
                '\u{200B}'..='\u{200F}' |
                '\u{2028}'..='\u{202F}' |
                '\u{FEFF}'
            )
        })
        .collect()
}

/// Replace control characters with spaces
pub fn remove_control_chars(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Strip a leading "by " or "author:" marker (case-insensitive)
///
/// ```
/// use newsdesk::parser::sanitize::strip_byline_prefix;
///
/// assert_eq!(strip_byline_prefix("By Jane Doe"), "Jane Doe");
/// assert_eq!(strip_byline_prefix("AUTHOR: Sam Lee"), "Sam Lee");
/// assert_eq!(strip_byline_prefix("Bypass Team"), "Bypass Team");
/// ```
pub fn strip_byline_prefix(text: &str) -> String {
    BYLINE_PREFIX.replace(text, "").trim().to_string()
}

/// Drop a trailing " | Site Name" from a page title
///
/// Dashes also appear inside headlines, so " - ..." is left to
/// [`strip_named_suffix`].
pub fn strip_site_suffix(title: &str) -> String {
    PIPE_SUFFIX.replace(title, "").trim().to_string()
}

/// Drop a trailing " - Site Name" when the suffix mentions one of `site_names`
///
/// ```
/// use newsdesk::parser::sanitize::strip_named_suffix;
///
/// assert_eq!(strip_named_suffix("Storm hits coast - BBC News", &["BBC"]), "Storm hits coast");
/// assert_eq!(strip_named_suffix("Markets slide - again", &["BBC"]), "Markets slide - again");
/// ```
pub fn strip_named_suffix(title: &str, site_names: &[&str]) -> String {
    let Some(caps) = DASH_SUFFIX.captures(title) else {
        return title.to_string();
    };
    let suffix = caps[1].to_lowercase();
    let named = site_names
        .iter()
        .map(|n| n.trim().to_lowercase())
        .any(|n| !n.is_empty() && suffix.contains(&n));

    if named {
        DASH_SUFFIX.replace(title, "").trim().to_string()
    } else {
        title.to_string()
    }
}

/// Check if text has meaningful content
pub fn has_content(text: &str) -> bool {
    text.chars().any(|c| c.is_alphanumeric())
}
