//! Scraper module for fetching HTML content from the Bas Play site
//!
//! This module provides HTTP client functionality with browser-like headers
//! and retry with exponential backoff on transient failures.

use rand::Rng;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

/// Errors that can occur during scraping operations
#[derive(Error, Debug)]
pub enum ScraperError {
    /// Network-related errors (connection timeout, DNS failure, etc.)
    #[error("Failed to connect to server: {0}")]
    NetworkError(String),

    /// HTTP non-200 status code errors
    #[error("Server returned status {0}")]
    HttpError(u16),

    /// Error reading response body
    #[error("Failed to read response body: {0}")]
    ResponseError(String),

    /// Rate limited by server
    #[error("Rate limited, retry after delay")]
    RateLimited,
}

/// Configuration for fetch retries and timeouts
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Maximum retries on transient failure
    pub max_retries: u32,
    /// Base delay for exponential backoff in milliseconds
    pub backoff_base_ms: u64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 1000,
            timeout_secs: 30,
        }
    }
}

/// The Chrome user agent the site is known to serve full markup to
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Marker header the cursor feed endpoint expects on XHR requests
const XHR_HEADER: (&str, &str) = ("X-Requested-With", "fetch");

/// HTTP client for scraping Bas Play pages
pub struct Scraper {
    client: Client,
    config: ScraperConfig,
}

impl Default for Scraper {
    fn default() -> Self {
        Self::new()
    }
}

impl Scraper {
    /// Create a new Scraper with default configuration
    pub fn new() -> Self {
        Self::with_config(ScraperConfig::default())
    }

    /// Create a new Scraper with custom configuration
    pub fn with_config(config: ScraperConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self { client, config }
    }

    /// Fetch a page body from the given URL, retrying on 429/5xx
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        self.fetch(url, &[]).await
    }

    /// Fetch with the XHR marker header; used for the cursor feed endpoint,
    /// which returns a JSON body instead of a full document
    pub async fn fetch_xhr(&self, url: &str) -> Result<String, ScraperError> {
        self.fetch(url, &[XHR_HEADER]).await
    }

    async fn fetch(
        &self,
        url: &str,
        extra_headers: &[(&str, &str)],
    ) -> Result<String, ScraperError> {
        let mut last_error = None;

        for attempt in 0..self.config.max_retries {
            if attempt > 0 {
                self.apply_backoff(attempt).await;
            }

            match self.do_fetch(url, extra_headers).await {
                Ok(body) => return Ok(body),
                Err(ScraperError::RateLimited) => {
                    tracing::warn!("Rate limited on attempt {}, backing off...", attempt + 1);
                    last_error = Some(ScraperError::RateLimited);
                    continue;
                }
                Err(ScraperError::HttpError(status)) if status >= 500 => {
                    tracing::warn!("HTTP {} on attempt {}, retrying...", status, attempt + 1);
                    last_error = Some(ScraperError::HttpError(status));
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| ScraperError::NetworkError("Max retries exceeded".to_string())))
    }

    /// Apply exponential backoff delay with jitter
    async fn apply_backoff(&self, attempt: u32) {
        let delay = self.config.backoff_base_ms * 2u64.pow(attempt);
        let jitter = rand::thread_rng().gen_range(0..500);
        sleep(Duration::from_millis(delay + jitter)).await;
    }

    /// Internal fetch implementation
    async fn do_fetch(
        &self,
        url: &str,
        extra_headers: &[(&str, &str)],
    ) -> Result<String, ScraperError> {
        let mut request = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Accept-Encoding", "gzip, deflate, br");

        for (name, value) in extra_headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ScraperError::NetworkError("Connection timeout".to_string())
            } else if e.is_connect() {
                ScraperError::NetworkError("Failed to connect to server".to_string())
            } else {
                ScraperError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();

        if status.as_u16() == 429 {
            return Err(ScraperError::RateLimited);
        }

        if status != StatusCode::OK {
            return Err(ScraperError::HttpError(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| ScraperError::ResponseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScraperConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.backoff_base_ms, 1000);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_scraper_with_config() {
        let config = ScraperConfig {
            max_retries: 5,
            backoff_base_ms: 2000,
            timeout_secs: 10,
        };
        let scraper = Scraper::with_config(config);
        assert_eq!(scraper.config.max_retries, 5);
        assert_eq!(scraper.config.backoff_base_ms, 2000);
    }

    #[test]
    fn test_user_agent_is_chrome() {
        assert!(USER_AGENT.contains("Chrome/"));
    }
}
