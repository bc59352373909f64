//! Robots.txt rule evaluation
//!
//! Thin wrapper over the robotstxt crate's matcher.

use robotstxt::DefaultMatcher;
use std::panic::{self, AssertUnwindSafe};

/// Parsed robots.txt data for one host
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Returns the raw robots.txt content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `user_agent` - The product token matched against `User-agent` groups
    ///
    /// # Returns
    ///
    /// * `Ok(bool)` - The matcher's verdict
    /// * `Err(String)` - The matcher failed on this input
    pub fn evaluate(&self, url: &str, user_agent: &str) -> Result<bool, String> {
        if self.content.trim().is_empty() {
            return Ok(true);
        }

        panic::catch_unwind(AssertUnwindSafe(|| {
            let mut matcher = DefaultMatcher::default();
            matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
        }))
        .map_err(|payload| {
            payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "robots matcher panicked".to_string())
        })
    }

    /// Checks if a URL is allowed, treating evaluation failures as allowed
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        self.evaluate(url, user_agent).unwrap_or(true)
    }
}
