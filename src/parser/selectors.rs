//! Generic extraction tables shared by every source
//!
//! Order inside each table is significant: strategies run top to bottom and
//! the first accepted value wins. Per-outlet date chains live in
//! [`crate::sources`] and run before [`GENERIC_DATE`].

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use scraper::Selector;

use super::strategy::{parse_selector, ParagraphChain, ParagraphGroup, Strategy, StrategyChain};
use super::{
    accept_author, accept_category, accept_date, accept_page_title, accept_site_name, accept_title,
};
use crate::{attr_strategy, text_strategy};

/// Keyword vocabulary for the URL path category fallback
pub const URL_CATEGORY_KEYWORDS: &[&str] = &[
    "news",
    "politics",
    "business",
    "tech",
    "world",
    "sport",
    "entertainment",
];

/// Paragraph minimum for summary candidates
pub const SUMMARY_MIN_CHARS: usize = 20;

/// Paragraph minimum for body candidates inside article containers
pub const CONTENT_MIN_CHARS: usize = 30;

/// Paragraph minimum for body candidates from bare `<p>` tags
pub const CONTENT_GENERIC_MIN_CHARS: usize = 50;

lazy_static! {
    pub static ref TITLE: StrategyChain<String> = StrategyChain::new(vec![
        text_strategy!("h1", accept_title),
        text_strategy!("title", accept_page_title),
        text_strategy!("h1.headline", accept_title),
        text_strategy!("h1.title", accept_title),
        text_strategy!(".article-title", accept_title),
        text_strategy!(".headline", accept_title),
        attr_strategy!(r#"meta[property="og:title"]"#, "content", accept_title),
        attr_strategy!(r#"meta[name="title"]"#, "content", accept_title),
        attr_strategy!(r#"meta[name="twitter:title"]"#, "content", accept_title),
        Strategy::json_ld("headline", accept_title),
    ]);

    pub static ref SITE_NAME: StrategyChain<String> = StrategyChain::new(vec![
        attr_strategy!(r#"meta[property="og:site_name"]"#, "content", accept_site_name),
        attr_strategy!(r#"meta[name="application-name"]"#, "content", accept_site_name),
    ]);

    pub static ref GENERIC_DATE: StrategyChain<DateTime<Utc>> = StrategyChain::new(vec![
        attr_strategy!(r#"meta[property="article:published_time"]"#, "content", accept_date),
        attr_strategy!(r#"meta[name="publish-date"]"#, "content", accept_date),
        attr_strategy!(r#"meta[name="pubdate"]"#, "content", accept_date),
        attr_strategy!(r#"meta[name="date"]"#, "content", accept_date),
        attr_strategy!(r#"meta[itemprop="datePublished"]"#, "content", accept_date),
        attr_strategy!(r#"meta[name="dc.date"]"#, "content", accept_date),
        Strategy::json_ld("datePublished", accept_date),
        attr_strategy!("time[datetime]", "datetime", accept_date),
        text_strategy!("time", accept_date),
        text_strategy!(".publication-date", accept_date),
        text_strategy!(".published", accept_date),
        text_strategy!(".timestamp", accept_date),
        text_strategy!(".date", accept_date),
    ]);

    pub static ref AUTHOR: StrategyChain<String> = StrategyChain::new(vec![
        attr_strategy!(r#"meta[name="author"]"#, "content", accept_author),
        text_strategy!(r#"[rel="author"]"#, accept_author),
        text_strategy!(".byline__name", accept_author),
        text_strategy!(".author-name", accept_author),
        text_strategy!(".byline", accept_author),
        text_strategy!(".author", accept_author),
        text_strategy!(r#"[itemprop="author"]"#, accept_author),
        attr_strategy!(r#"meta[property="article:author"]"#, "content", accept_author),
        Strategy::json_ld("author", accept_author),
    ]);

    pub static ref CATEGORY: StrategyChain<String> = StrategyChain::new(vec![
        text_strategy!(".category", accept_category),
        text_strategy!(".section-name", accept_category),
        text_strategy!(".article-section", accept_category),
        text_strategy!(".topic", accept_category),
        attr_strategy!(r#"meta[property="article:section"]"#, "content", accept_category),
        attr_strategy!(r#"meta[name="section"]"#, "content", accept_category),
        Strategy::json_ld("articleSection", accept_category),
        text_strategy!(".breadcrumb li:last-child a", accept_category),
        text_strategy!(r#"nav[aria-label="breadcrumb"] a"#, accept_category),
        text_strategy!(".breadcrumb a", accept_category),
    ]);

    pub static ref SUMMARY: ParagraphChain = ParagraphChain::new(vec![
        ParagraphGroup::new(".article-body p", parse_selector!(".article-body p"), SUMMARY_MIN_CHARS),
        ParagraphGroup::new(".content p", parse_selector!(".content p"), SUMMARY_MIN_CHARS),
        ParagraphGroup::new("article p", parse_selector!("article p"), SUMMARY_MIN_CHARS),
        ParagraphGroup::new(".story p", parse_selector!(".story p"), SUMMARY_MIN_CHARS),
        ParagraphGroup::new("p", parse_selector!("p"), SUMMARY_MIN_CHARS),
    ]);

    pub static ref CONTENT: ParagraphChain = ParagraphChain::new(vec![
        ParagraphGroup::new(".article-body p", parse_selector!(".article-body p"), CONTENT_MIN_CHARS),
        ParagraphGroup::new(".article-content p", parse_selector!(".article-content p"), CONTENT_MIN_CHARS),
        ParagraphGroup::new(".story-body p", parse_selector!(".story-body p"), CONTENT_MIN_CHARS),
        ParagraphGroup::new(".content p", parse_selector!(".content p"), CONTENT_MIN_CHARS),
        ParagraphGroup::new("article p", parse_selector!("article p"), CONTENT_MIN_CHARS),
        ParagraphGroup::new(".story p", parse_selector!(".story p"), CONTENT_MIN_CHARS),
        ParagraphGroup::new("p", parse_selector!("p"), CONTENT_GENERIC_MIN_CHARS),
    ]);
}
