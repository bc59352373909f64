//! Top-level error supervisor
//!
//! Every error raised while crawling ends up here together with a short
//! context string. The supervisor logs it, counts it per kind, and decides
//! whether the crawl carries on (the default for every kind) or stops.

use crate::CrawlError;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Error classification used for supervision policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Fetch or network failure, non-success status
    Transport,
    /// Malformed or unsupported link/image reference
    Parse,
    /// File system or serialization failure
    Storage,
    /// Panicked task or anything else
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transport => "transport",
            Self::Parse => "parse",
            Self::Storage => "storage",
            Self::Unexpected => "unexpected",
        };
        f.write_str(name)
    }
}

/// What the supervisor decided about an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Escalate,
}

#[derive(Debug, Default)]
pub struct Supervisor {
    escalate: HashSet<ErrorKind>,
    counts: BTreeMap<ErrorKind, u64>,
}

impl Supervisor {
    /// Creates a supervisor that escalates the given kinds
    pub fn new(escalate: impl IntoIterator<Item = ErrorKind>) -> Self {
        Self {
            escalate: escalate.into_iter().collect(),
            counts: BTreeMap::new(),
        }
    }

    /// Policy for one kind
    pub fn verdict(&self, kind: ErrorKind) -> Verdict {
        if self.escalate.contains(&kind) {
            Verdict::Escalate
        } else {
            Verdict::Continue
        }
    }

    /// Logs and counts an error
    ///
    /// Returns the error back only when its kind escalates.
    pub fn report(&mut self, context: &str, error: CrawlError) -> Result<(), CrawlError> {
        let kind = error.kind();
        *self.counts.entry(kind).or_insert(0) += 1;

        match self.verdict(kind) {
            Verdict::Escalate => {
                tracing::error!("{} error while {}: {} (stopping crawl)", kind, context, error);
                Err(error)
            }
            Verdict::Continue => {
                match kind {
                    ErrorKind::Transport | ErrorKind::Parse => {
                        tracing::warn!("{} error while {}: {}", kind, context, error)
                    }
                    ErrorKind::Storage | ErrorKind::Unexpected => {
                        tracing::error!("{} error while {}: {}", kind, context, error)
                    }
                }
                Ok(())
            }
        }
    }

    /// Errors seen so far, per kind
    pub fn counts(&self) -> &BTreeMap<ErrorKind, u64> {
        &self.counts
    }
}
