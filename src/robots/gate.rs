//! Per-host robots.txt cache and admission decision
//!
//! Policies are created lazily on the first URL seen for a host and kept for
//! the lifetime of the gate. A failed robots.txt fetch caches an "unknown"
//! sentinel that allows every path on that host.

use crate::robots::ParsedRobots;
use crate::url::robots_url;
use crate::CrawlError;
use std::collections::{HashMap, HashSet};
use url::Url;

/// Cached robots state for one host
#[derive(Debug, Clone)]
pub enum RobotsPolicy {
    /// robots.txt fetched and parsed
    Rules(ParsedRobots),
    /// robots.txt unavailable; every path is allowed
    Unknown,
}

/// Outcome of a cache-only robots check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotsCheck {
    Allowed,
    Denied,
    /// No policy yet. `fetch` is true for the first check of the host, which
    /// is responsible for starting the robots.txt fetch.
    Unresolved { robots_url: String, fetch: bool },
}

/// Robots-exclusion gate for one crawl
#[derive(Debug)]
pub struct RobotsGate {
    user_agent: String,
    policies: HashMap<String, RobotsPolicy>,
    pending: HashSet<String>,
}

impl RobotsGate {
    /// Creates an empty gate evaluating rules for `user_agent`
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            policies: HashMap::new(),
            pending: HashSet::new(),
        }
    }

    /// Checks a URL against the cached policy without any I/O
    pub fn check(&mut self, url: &Url) -> RobotsCheck {
        let robots = robots_url(url);

        match self.policies.get(&robots) {
            Some(policy) => {
                if self.evaluate(policy, url) {
                    RobotsCheck::Allowed
                } else {
                    RobotsCheck::Denied
                }
            }
            None => {
                let fetch = self.pending.insert(robots.clone());
                RobotsCheck::Unresolved {
                    robots_url: robots,
                    fetch,
                }
            }
        }
    }

    /// Stores the outcome of a robots.txt fetch
    ///
    /// Any fetch failure caches [`RobotsPolicy::Unknown`].
    pub fn resolve(&mut self, robots_url: &str, fetched: Result<String, CrawlError>) {
        self.pending.remove(robots_url);

        let policy = match fetched {
            Ok(body) => {
                tracing::debug!("Cached robots.txt from {}", robots_url);
                RobotsPolicy::Rules(ParsedRobots::from_content(&body))
            }
            Err(e) => {
                tracing::warn!(
                    "robots.txt unavailable at {} ({}), allowing all paths on this host",
                    robots_url,
                    e
                );
                RobotsPolicy::Unknown
            }
        };

        self.policies.insert(robots_url.to_string(), policy);
    }

    /// Returns the cached policy for a robots.txt URL
    pub fn policy(&self, robots_url: &str) -> Option<&RobotsPolicy> {
        self.policies.get(robots_url)
    }

    /// Number of hosts with a resolved policy
    pub fn host_count(&self) -> usize {
        self.policies.len()
    }

    fn evaluate(&self, policy: &RobotsPolicy, url: &Url) -> bool {
        match policy {
            RobotsPolicy::Unknown => true,
            RobotsPolicy::Rules(rules) => match rules.evaluate(url.as_str(), &self.user_agent) {
                Ok(allowed) => allowed,
                Err(e) => {
                    tracing::warn!("robots.txt evaluation failed for {}: {}, allowing", url, e);
                    true
                }
            },
        }
    }
}
