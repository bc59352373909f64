//! Configuration module
//!
//! Loads, parses, and validates the optional TOML configuration file. Every
//! section has defaults, so a crawl can start from nothing but a seed URL.
//!
//! # Example
//!
//! ```no_run
//! use polite_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Fetch concurrency: {}", config.crawler.max_concurrent_fetches);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, LimitsConfig, OutputConfig, SupervisorConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
