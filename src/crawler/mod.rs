//! HTTP fetch boundary shared by discovery and ingestion
//!
//! One [`Fetcher`] is built from [`crate::config::FetchConfig`] and passed by
//! `Arc` to every component that needs the network.

pub mod fetcher;
pub mod headers;

pub use fetcher::{FetchedPage, Fetcher};
pub use headers::{build_browser_headers, random_user_agent, USER_AGENTS};
