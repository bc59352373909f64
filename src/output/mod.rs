//! Output module for crawl summaries and graph statistics
//!
//! This module handles:
//! - Summarizing a persisted or in-memory link graph
//! - Reporting the counters of a finished run

pub mod stats;
mod summary;

pub use stats::{print_statistics, GraphStatistics};
pub use summary::{print_summary, CrawlSummary, StopReason};
