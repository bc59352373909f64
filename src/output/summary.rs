//! Per-run crawl summary

use crate::crawler::ErrorKind;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Why the dispatcher loop stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopReason {
    /// No queued events and no outstanding tasks
    #[default]
    Exhausted,
    /// The wall-clock deadline passed
    Deadline,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => f.write_str("frontier exhausted"),
            Self::Deadline => f.write_str("deadline reached"),
        }
    }
}

/// Counters collected by the dispatcher during one run
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    pub pages_fetched: u64,
    pub pages_failed: u64,
    pub pages_skipped: u64,
    pub robots_denied: u64,
    pub limit_skips: u64,
    pub images_downloaded: u64,
    pub image_failures: u64,
    pub errors: BTreeMap<ErrorKind, u64>,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

impl CrawlSummary {
    pub fn total_errors(&self) -> u64 {
        self.errors.values().sum()
    }
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!(
        "Finished after {:.1}s ({})",
        summary.elapsed.as_secs_f64(),
        summary.stop_reason
    );
    println!();

    println!("Pages:");
    println!("  Fetched: {}", summary.pages_fetched);
    println!("  Failed: {}", summary.pages_failed);
    println!("  Skipped (not HTML): {}", summary.pages_skipped);
    println!("  Disallowed by robots.txt: {}", summary.robots_denied);
    println!("  Outside limits: {}", summary.limit_skips);
    println!();

    println!("Images:");
    println!("  Downloaded: {}", summary.images_downloaded);
    println!("  Failed: {}", summary.image_failures);
    println!();

    if summary.errors.is_empty() {
        println!("No errors.");
    } else {
        println!("Errors ({}):", summary.total_errors());
        for (kind, count) in &summary.errors {
            println!("  {}: {}", kind, count);
        }
    }
}
