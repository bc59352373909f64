//! Crawl frontier: admission decisions for discovered URLs
//!
//! This module handles:
//! - The visited set (a URL is fetched at most once per crawl)
//! - Page budget and depth limits
//! - Parking candidates whose host has no robots policy yet
//! - The randomized politeness delay before each fetch

use crate::config::{CrawlerConfig, LimitsConfig};
use crate::crawler::VisitCandidate;
use crate::robots::{RobotsCheck, RobotsGate};
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Why a candidate fell outside the crawl bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitReason {
    /// Deeper than `max-depth`
    Depth(u32),
    /// `max-pages` pages already admitted
    PageBudget(usize),
}

impl fmt::Display for LimitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Depth(max) => write!(f, "beyond max depth {}", max),
            Self::PageBudget(max) => write!(f, "page budget of {} reached", max),
        }
    }
}

/// Decision for one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consideration {
    /// Already admitted earlier in this crawl
    AlreadyVisited,
    /// Outside the configured limits
    OutOfBounds(LimitReason),
    /// Disallowed by the host's robots.txt
    Denied,
    /// Waiting for the host's robots.txt; `fetch_robots` asks the caller to
    /// start that fetch
    Parked {
        robots_url: String,
        fetch_robots: bool,
    },
    /// Marked visited; fetch after `delay`
    Admitted { delay: Duration },
}

/// The crawl frontier
#[derive(Debug)]
pub struct Frontier {
    visited: HashSet<String>,

    /// robots.txt URL -> candidates waiting for it
    parked: HashMap<String, Vec<VisitCandidate>>,

    max_pages: Option<usize>,
    max_depth: Option<u32>,
    min_delay: Duration,
    jitter: Duration,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new(crawler: &CrawlerConfig, limits: &LimitsConfig) -> Self {
        Self {
            visited: HashSet::new(),
            parked: HashMap::new(),
            max_pages: limits.max_pages,
            max_depth: limits.max_depth,
            min_delay: Duration::from_millis(crawler.min_delay_ms),
            jitter: Duration::from_millis(crawler.jitter_ms),
        }
    }

    /// Decides what happens to a discovered URL
    ///
    /// The order of checks is: visited, limits, robots. Admission marks the
    /// URL visited in the same step, so two candidates for one URL can never
    /// both be admitted.
    pub fn consider(
        &mut self,
        candidate: &VisitCandidate,
        robots: &mut RobotsGate,
    ) -> Consideration {
        if self.is_visited(&candidate.url) {
            return Consideration::AlreadyVisited;
        }

        if let Some(reason) = self.limit_exceeded(candidate) {
            return Consideration::OutOfBounds(reason);
        }

        match robots.check(&candidate.url) {
            RobotsCheck::Denied => Consideration::Denied,
            RobotsCheck::Unresolved { robots_url, fetch } => {
                self.parked
                    .entry(robots_url.clone())
                    .or_default()
                    .push(candidate.clone());
                Consideration::Parked {
                    robots_url,
                    fetch_robots: fetch,
                }
            }
            RobotsCheck::Allowed => match self.admit(&candidate.url) {
                Some(delay) => Consideration::Admitted { delay },
                None => Consideration::AlreadyVisited,
            },
        }
    }

    /// Marks `url` visited, returning the politeness delay if it was new
    pub fn admit(&mut self, url: &Url) -> Option<Duration> {
        if self.visited.insert(url.as_str().to_string()) {
            Some(self.politeness_delay())
        } else {
            None
        }
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    /// Checks depth and page budget for a candidate
    pub fn limit_exceeded(&self, candidate: &VisitCandidate) -> Option<LimitReason> {
        if let Some(max) = self.max_depth {
            if candidate.depth > max {
                return Some(LimitReason::Depth(max));
            }
        }

        if let Some(max) = self.max_pages {
            if self.visited.len() >= max {
                return Some(LimitReason::PageBudget(max));
            }
        }

        None
    }

    /// Takes every candidate parked on `robots_url`
    pub fn release(&mut self, robots_url: &str) -> Vec<VisitCandidate> {
        self.parked.remove(robots_url).unwrap_or_default()
    }

    /// Minimum delay plus a uniformly random jitter
    pub fn politeness_delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.min_delay;
        }

        let jitter_ms = rand::rng().random_range(0..self.jitter.as_millis() as u64);
        self.min_delay + Duration::from_millis(jitter_ms)
    }

    /// Number of URLs admitted so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of candidates waiting on robots.txt
    pub fn parked_count(&self) -> usize {
        self.parked.values().map(Vec::len).sum()
    }
}
