//! polite-crawler: a polite, stateful web crawler
//!
//! Starting from a seed URL this crate follows hyperlinks, honours each host's
//! robots.txt, downloads every distinct image exactly once, and keeps an
//! incrementally updated link graph persisted as JSON.

pub mod config;
pub mod crawler;
pub mod graph;
pub mod images;
pub mod output;
pub mod robots;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Task failed: {0}")]
    Task(String),
}

impl CrawlError {
    /// Classifies the error for the supervisor
    pub fn kind(&self) -> crawler::ErrorKind {
        use crawler::ErrorKind;

        match self {
            Self::Http { .. } | Self::HttpStatus { .. } | Self::Reqwest(_) => ErrorKind::Transport,
            Self::UrlError(_) | Self::UrlParse(_) => ErrorKind::Parse,
            Self::Io(_) | Self::Write { .. } | Self::Json(_) => ErrorKind::Storage,
            Self::Config(_) | Self::Task(_) => ErrorKind::Unexpected,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),

    #[error("Empty reference")]
    Empty,
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, Dispatcher};
pub use output::CrawlSummary;
pub use graph::{EdgeRecord, LinkGraph, PageRecord};
pub use url::{resolve_reference, robots_url};
