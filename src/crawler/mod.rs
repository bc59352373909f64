//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and HTML reference extraction
//! - Admission of discovered URLs (visited set, limits, politeness delay)
//! - The event-driven dispatcher that owns all crawl state
//! - Error supervision

mod dispatcher;
mod events;
mod fetcher;
mod frontier;
mod parser;
mod processor;
mod supervisor;

pub use dispatcher::Dispatcher;
pub use events::{event_channel, CrawlEvent, EventSender, VisitCandidate};
pub use fetcher::{build_http_client, fetch_url, FetchResult};
pub use frontier::{Consideration, Frontier, LimitReason};
pub use parser::{parse_html, ParsedPage};
pub use processor::{ElementKind, ExtractedPage, ItemFailure, PageProcessor};
pub use supervisor::{ErrorKind, Supervisor, Verdict};

use crate::config::Config;
use crate::output::CrawlSummary;
use crate::Result;

/// Runs a complete crawl from one seed URL
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client and an empty crawl state
/// 2. Follow links from `seed`, honouring robots.txt and the configured limits
/// 3. Download every distinct image once
/// 4. Persist the link graph, ending with a final snapshot
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl finished
/// * `Err(CrawlError)` - Invalid seed, client setup failure, or an escalated error
///
/// # Example
///
/// ```no_run
/// use polite_crawler::config::Config;
/// use polite_crawler::crawler::crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = crawl(Config::default(), "https://example.com/").await?;
/// println!("{} pages fetched", summary.pages_fetched);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config, seed: &str) -> Result<CrawlSummary> {
    let mut dispatcher = Dispatcher::new(config)?;
    dispatcher.run(seed).await
}
