use crate::crawler::ErrorKind;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub supervisor: SupervisorConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Minimum politeness delay before a page fetch (milliseconds)
    #[serde(rename = "min-delay-ms")]
    pub min_delay_ms: u64,

    /// Upper bound (exclusive) of the random jitter added to the delay (milliseconds)
    #[serde(rename = "jitter-ms")]
    pub jitter_ms: u64,

    /// Maximum number of concurrent page fetches
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: u32,

    /// Maximum number of concurrent image downloads
    #[serde(rename = "max-concurrent-downloads")]
    pub max_concurrent_downloads: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 3000,
            jitter_ms: 7000,
            max_concurrent_fetches: 8,
            max_concurrent_downloads: 4,
            request_timeout_secs: 30,
        }
    }
}

/// Termination policy. Every limit is optional; unset means unbounded.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum number of pages admitted to fetch
    #[serde(rename = "max-pages")]
    pub max_pages: Option<usize>,

    /// Maximum link depth from the seed (seed is depth 0)
    #[serde(rename = "max-depth")]
    pub max_depth: Option<u32>,

    /// Wall-clock budget for the whole crawl (seconds)
    #[serde(rename = "deadline-secs")]
    pub deadline_secs: Option<u64>,
}

impl LimitsConfig {
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the token matched against robots.txt groups
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "MyWebCrawlerBot".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Full HTTP user agent string: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the persisted link graph
    #[serde(rename = "data-path")]
    pub data_path: String,

    /// Directory holding downloaded images
    #[serde(rename = "image-dir")]
    pub image_dir: String,

    /// Minimum interval between graph snapshots (milliseconds)
    #[serde(rename = "flush-interval-ms")]
    pub flush_interval_ms: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_path: "data.json".to_string(),
            image_dir: "downloaded_images".to_string(),
            flush_interval_ms: 1000,
        }
    }
}

/// Error escalation policy
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Error kinds that stop the crawl instead of being logged
    pub escalate: Vec<ErrorKind>,
}
