//! HTTP fetcher implementation
//!
//! This module handles page requests for the crawler, including:
//! - Building the shared HTTP client with the crawler's user agent
//! - GET requests with timeouts
//! - Content-Type screening
//! - Error classification

use crate::config::Config;
use crate::{CrawlError, Result};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// Page body content
        body: String,
    },

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch {
        /// The actual Content-Type received
        content_type: String,
    },

    /// Non-success HTTP status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, body read failure, etc.)
    NetworkError {
        /// The underlying client error
        error: reqwest::Error,
    },
}

impl FetchResult {
    /// Converts the result into the page body, if there is one to parse
    ///
    /// * `Ok(Some(body))` - HTML page
    /// * `Ok(None)` - Not HTML, nothing to extract
    /// * `Err(CrawlError)` - Transport failure
    ///
    /// Links are resolved against the requested `url`, so a redirect is only
    /// logged.
    pub fn into_html(self, url: &str) -> Result<Option<String>> {
        match self {
            Self::Success { final_url, body } => {
                if final_url != url {
                    tracing::debug!("{} redirected to {}", url, final_url);
                }
                Ok(Some(body))
            }
            Self::ContentMismatch { content_type } => {
                tracing::debug!("Skipping {}: content type {}", url, content_type);
                Ok(None)
            }
            Self::HttpError { status_code } => Err(CrawlError::HttpStatus {
                url: url.to_string(),
                status: status_code,
            }),
            Self::NetworkError { error } => Err(CrawlError::Http {
                url: url.to_string(),
                source: error,
            }),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use polite_crawler::config::Config;
/// use polite_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(Duration::from_secs(config.crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx, HTML or no Content-Type | Success |
/// | 2xx, other Content-Type | ContentMismatch |
/// | Non-2xx after redirects | HttpError |
/// | Timeout, connection refused, TLS, body read | NetworkError |
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(error) => {
            if error.is_timeout() {
                tracing::debug!("Request timeout for {}", url);
            } else if error.is_connect() {
                tracing::debug!("Connection failed for {}", url);
            }
            return FetchResult::NetworkError { error };
        }
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    // Check Content-Type
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase());

    if let Some(content_type) = content_type {
        if !is_html(&content_type) {
            return FetchResult::ContentMismatch { content_type };
        }
    }

    let final_url = response.url().to_string();
    match response.text().await {
        Ok(body) => FetchResult::Success { final_url, body },
        Err(error) => FetchResult::NetworkError { error },
    }
}

fn is_html(content_type: &str) -> bool {
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}
