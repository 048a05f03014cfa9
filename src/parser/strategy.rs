//! Ordered-strategy interpreter for field extraction
//!
//! A [`StrategyChain`] is a list of (locator, acceptor) pairs. Strategies are
//! tried in order and the first one whose located value is accepted wins.
//! [`ParagraphChain`] is the multi-element variant used for summary and body
//! text: the first selector group that yields a qualifying paragraph wins.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;

use crate::utils::normalize_whitespace;

// Helper macro to parse selectors at table construction
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

pub(crate) use parse_selector;

static JSON_LD: LazyLock<Selector> =
    LazyLock::new(|| parse_selector!(r#"script[type="application/ld+json"]"#));

/// Where a candidate value comes from
#[derive(Debug, Clone)]
pub enum Locator {
    /// Whitespace-normalized text of the first matching element
    Text(Selector),
    /// Attribute of the first matching element that carries it
    Attr(Selector, &'static str),
    /// First value stored under this key in any JSON-LD block
    JsonLd(&'static str),
}

impl Locator {
    /// Locate a raw candidate string in the document
    pub fn locate(&self, document: &Html) -> Option<String> {
        let raw = match self {
            Self::Text(selector) => document
                .select(selector)
                .next()
                .map(|el| element_text(&el))?,
            Self::Attr(selector, attr) => document
                .select(selector)
                .filter_map(|el| el.value().attr(attr))
                .find(|v| !v.trim().is_empty())
                .map(normalize_whitespace)?,
            Self::JsonLd(key) => json_ld_value(document, key)?,
        };

        if raw.is_empty() {
            None
        } else {
            Some(raw)
        }
    }
}

/// Turn a located string into a validated value, or reject it
pub type Accept<T> = fn(&str) -> Option<T>;

/// One (locator, acceptor) pair
#[derive(Debug, Clone)]
pub struct Strategy<T> {
    label: &'static str,
    locator: Locator,
    accept: Accept<T>,
}

impl<T> Strategy<T> {
    /// Element text strategy
    pub fn text(css: &'static str, selector: Selector, accept: Accept<T>) -> Self {
        Self {
            label: css,
            locator: Locator::Text(selector),
            accept,
        }
    }

    /// Element attribute strategy
    pub fn attr(
        css: &'static str,
        selector: Selector,
        attr: &'static str,
        accept: Accept<T>,
    ) -> Self {
        Self {
            label: css,
            locator: Locator::Attr(selector, attr),
            accept,
        }
    }

    /// JSON-LD key strategy
    pub fn json_ld(key: &'static str, accept: Accept<T>) -> Self {
        Self {
            label: key,
            locator: Locator::JsonLd(key),
            accept,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Locate and accept in one step
    pub fn apply(&self, document: &Html) -> Option<T> {
        self.locator
            .locate(document)
            .and_then(|raw| (self.accept)(&raw))
    }
}

/// Build a text strategy from a CSS literal
#[macro_export]
macro_rules! text_strategy {
    ($css:literal, $accept:expr) => {
        $crate::parser::strategy::Strategy::text(
            $css,
            ::scraper::Selector::parse($css).expect(concat!("Invalid CSS selector: ", $css)),
            $accept,
        )
    };
}

/// Build an attribute strategy from a CSS literal
#[macro_export]
macro_rules! attr_strategy {
    ($css:literal, $attr:literal, $accept:expr) => {
        $crate::parser::strategy::Strategy::attr(
            $css,
            ::scraper::Selector::parse($css).expect(concat!("Invalid CSS selector: ", $css)),
            $attr,
            $accept,
        )
    };
}

/// Ordered list of strategies; first accepted value wins
#[derive(Debug, Clone)]
pub struct StrategyChain<T> {
    strategies: Vec<Strategy<T>>,
}

impl<T> StrategyChain<T> {
    pub fn new(strategies: Vec<Strategy<T>>) -> Self {
        Self { strategies }
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run strategies in order and stop at the first accepted value
    pub fn resolve(&self, document: &Html) -> Option<T> {
        self.strategies.iter().find_map(|strategy| {
            let value = strategy.apply(document);
            if value.is_some() {
                tracing::trace!(strategy = strategy.label(), "Strategy matched");
            }
            value
        })
    }
}

/// Resolve across several chains in order
pub fn resolve_chains<T>(chains: &[&StrategyChain<T>], document: &Html) -> Option<T> {
    chains.iter().find_map(|chain| chain.resolve(document))
}

/// One paragraph selector group with its minimum length
#[derive(Debug, Clone)]
pub struct ParagraphGroup {
    label: &'static str,
    selector: Selector,
    min_chars: usize,
}

impl ParagraphGroup {
    pub fn new(css: &'static str, selector: Selector, min_chars: usize) -> Self {
        Self {
            label: css,
            selector,
            min_chars,
        }
    }

    /// Paragraphs whose trimmed length exceeds `min_chars`, in document order
    pub fn qualifying(&self, document: &Html, limit: usize) -> Vec<String> {
        document
            .select(&self.selector)
            .map(|el| element_text(&el))
            .filter(|text| text.chars().count() > self.min_chars)
            .take(limit)
            .collect()
    }
}

/// Ordered paragraph groups; the first group with a qualifying paragraph wins
#[derive(Debug, Clone)]
pub struct ParagraphChain {
    groups: Vec<ParagraphGroup>,
}

impl ParagraphChain {
    pub fn new(groups: Vec<ParagraphGroup>) -> Self {
        Self { groups }
    }

    /// Up to `limit` qualifying paragraphs from the first group that has any
    pub fn collect(&self, document: &Html, limit: usize) -> Option<Vec<String>> {
        self.groups.iter().find_map(|group| {
            let paragraphs = group.qualifying(document, limit);
            if paragraphs.is_empty() {
                None
            } else {
                tracing::trace!(group = group.label, count = paragraphs.len(), "Paragraph group matched");
                Some(paragraphs)
            }
        })
    }
}

/// Whitespace-normalized text content of an element
pub fn element_text(element: &ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// First value under `key` in any JSON-LD block of the document
pub fn json_ld_value(document: &Html, key: &str) -> Option<String> {
    document
        .select(&JSON_LD)
        .filter_map(|script| {
            let raw = script.text().collect::<String>();
            serde_json::from_str::<Value>(raw.trim()).ok()
        })
        .find_map(|json| find_key(&json, key).and_then(value_text))
}

fn find_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map
            .get(key)
            .or_else(|| map.values().find_map(|v| find_key(v, key))),
        Value::Array(items) => items.iter().find_map(|v| find_key(v, key)),
        _ => None,
    }
}

fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => Some(normalize_whitespace(s)),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("name").and_then(value_text),
        Value::Array(items) => items.iter().find_map(value_text),
        _ => None,
    };
    text.filter(|s| !s.is_empty())
}
