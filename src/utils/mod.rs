//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;

use anyhow::{Context, Result};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

    let re = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

    re.replace_all(text.trim(), " ").to_string()
}

/// Turn a bare domain or origin into an origin URL (`https://host`)
///
/// ```
/// use newsdesk::utils::domain_origin;
///
/// assert_eq!(domain_origin("bbc.com").unwrap(), "https://bbc.com");
/// assert_eq!(domain_origin("http://127.0.0.1:8080/").unwrap(), "http://127.0.0.1:8080");
/// ```
pub fn domain_origin(domain: &str) -> Result<String> {
    let trimmed = domain.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&candidate).with_context(|| format!("Invalid domain: {domain}"))?;
    if parsed.host_str().is_none() {
        anyhow::bail!("No host in domain: {domain}");
    }

    Ok(parsed.origin().ascii_serialization())
}

/// Truncate text to at most `max_chars` characters, appending `marker` when cut
///
/// Counts characters, not bytes, so multi-byte text never splits mid-codepoint.
pub fn truncate_chars(text: &str, max_chars: usize, marker: &str) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => format!("{}{marker}", &text[..byte_idx]),
    }
}

/// Title-case each whitespace- or hyphen-separated word
///
/// ```
/// use newsdesk::utils::title_case;
///
/// assert_eq!(title_case("world news"), "World News");
/// assert_eq!(title_case("US-POLITICS"), "Us-Politics");
/// ```
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;

    for ch in text.chars() {
        if ch.is_whitespace() || ch == '-' || ch == '_' {
            out.push(if ch == '_' { ' ' } else { ch });
            at_word_start = true;
        } else if at_word_start {
            out.extend(ch.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }

    out
}
