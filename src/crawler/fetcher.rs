//! Shared HTTP fetcher used by discovery and ingestion
//!
//! - Randomized User-Agent and browser header profile per request
//! - Rate limiting with governor
//! - Per-request timeout, no retries (a failed URL is skipped for the run)
//! - Charset detection from Content-Type or `<meta charset>`

use crate::config::FetchConfig;
use crate::crawler::headers::{build_browser_headers, random_user_agent};
use crate::utils::error::FetchError;
use encoding_rs::{Encoding, UTF_8};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{Client, Response};
use std::num::NonZeroU32;
use std::sync::LazyLock;
use std::time::Duration;

static META_CHARSET: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([A-Za-z0-9_\-]+)"#).unwrap()
});

/// A successfully fetched document
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects
    pub final_url: String,

    /// Decoded body
    pub body: String,
}

/// HTTP client with timeout, header rotation and rate limiting
pub struct Fetcher {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Rate limiter to control request frequency
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    accept_language: String,
}

impl Fetcher {
    /// Create a fetcher from the fetch configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::RateLimitInit` for a zero rate, or
    /// `FetchError::Http` if the HTTP client cannot be created
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        Self::with_settings(
            config.requests_per_second,
            Duration::from_secs(config.request_timeout_secs),
            &config.accept_language,
        )
    }

    /// Create a fetcher with explicit settings
    pub fn with_settings(
        requests_per_second: u32,
        timeout: Duration,
        accept_language: &str,
    ) -> Result<Self, FetchError> {
        let rate = NonZeroU32::new(requests_per_second)
            .ok_or(FetchError::RateLimitInit(requests_per_second))?;

        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .deflate(true)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(Quota::per_second(rate)),
            accept_language: accept_language.to_string(),
        })
    }

    /// Fetch a URL and return its decoded body
    ///
    /// # Errors
    ///
    /// - `FetchError::InvalidUrl` if the URL does not parse
    /// - `FetchError::Timeout` / `FetchError::Http` for transport failures
    /// - `FetchError::Status` for any non-2xx response
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed = url::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;

        self.rate_limiter.until_ready().await;

        let user_agent = random_user_agent();
        tracing::debug!(url = %parsed, user_agent, "Fetching");

        let response = self
            .client
            .get(parsed)
            .headers(build_browser_headers(user_agent, &self.accept_language))
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        self.decode_response(response).await
    }

    /// Fetch a URL and return only the body text
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.fetch(url).await.map(|page| page.body)
    }

    async fn decode_response(&self, response: Response) -> Result<FetchedPage, FetchError> {
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();

        let bytes = response.bytes().await.map_err(FetchError::from_reqwest)?;
        let body = decode_bytes(&bytes, &content_type)?;

        Ok(FetchedPage { final_url, body })
    }
}

/// Decode bytes to a string using the declared charset
///
/// Order: Content-Type `charset=`, then `<meta charset>` in the first 2KB,
/// then UTF-8. Malformed sequences under a declared charset are replaced; an
/// undeclared body that is not valid UTF-8 is decoded lossily.
pub fn decode_bytes(bytes: &[u8], content_type: &str) -> Result<String, FetchError> {
    let encoding = charset_from_content_type(content_type)
        .or_else(|| charset_from_meta(bytes))
        .unwrap_or(UTF_8);

    let (cow, _encoding, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = encoding.name(), "Replaced malformed byte sequences");
    }

    if cow.is_empty() && !bytes.is_empty() {
        return Err(FetchError::Decode(format!(
            "{} produced no text from {} bytes",
            encoding.name(),
            bytes.len()
        )));
    }

    Ok(cow.into_owned())
}

fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, value)| Encoding::for_label(value.trim().trim_matches('"').as_bytes()))
}

fn charset_from_meta(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(2048)]);
    META_CHARSET
        .captures(&head)
        .and_then(|caps| caps.get(1))
        .and_then(|m| Encoding::for_label(m.as_str().as_bytes()))
}
