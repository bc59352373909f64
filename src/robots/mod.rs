//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching
//! robots.txt files. Unavailable robots.txt never blocks crawling.

mod gate;
mod parser;

pub use gate::{RobotsCheck, RobotsGate, RobotsPolicy};
pub use parser::ParsedRobots;

use crate::{CrawlError, Result};
use reqwest::Client;

/// Fetches robots.txt
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `robots_url` - Absolute URL of the robots.txt file
///
/// # Returns
///
/// * `Ok(String)` - The robots.txt body (2xx response)
/// * `Err(CrawlError)` - Network failure or non-success status
pub async fn fetch_robots(client: &Client, robots_url: &str) -> Result<String> {
    tracing::debug!("Fetching robots.txt: {}", robots_url);

    let response = client
        .get(robots_url)
        .send()
        .await
        .map_err(|source| CrawlError::Http {
            url: robots_url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(CrawlError::HttpStatus {
            url: robots_url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|source| CrawlError::Http {
        url: robots_url.to_string(),
        source,
    })
}
