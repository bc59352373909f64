//! Events exchanged between crawl tasks and the dispatcher
//!
//! Spawned tasks never touch crawl state; they report what happened by
//! emitting one of these events back to the dispatcher's inbox.

use crate::CrawlError;
use std::path::PathBuf;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use url::Url;

/// A discovered URL waiting for an admission decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitCandidate {
    /// Absolute URL to visit
    pub url: Url,

    /// Page that linked to `url` (`None` for the seed)
    pub referrer: Option<Url>,

    /// Link distance from the seed
    pub depth: u32,
}

impl VisitCandidate {
    pub fn seed(url: Url) -> Self {
        Self {
            url,
            referrer: None,
            depth: 0,
        }
    }

    /// Candidate for a link found on this candidate's page
    pub fn child(&self, url: Url) -> Self {
        Self {
            url,
            referrer: Some(self.url.clone()),
            depth: self.depth + 1,
        }
    }
}

/// Everything the dispatcher reacts to
#[derive(Debug)]
pub enum CrawlEvent {
    /// A URL was discovered and should be considered for fetching
    Visit(VisitCandidate),

    /// A robots.txt fetch finished
    RobotsFetched {
        robots_url: String,
        result: Result<String, CrawlError>,
    },

    /// A page fetch finished; `Ok(None)` means the body was not HTML
    PageFetched {
        candidate: VisitCandidate,
        result: Result<Option<String>, CrawlError>,
    },

    /// An image download finished
    ImageDownloaded {
        image_url: String,
        result: Result<PathBuf, CrawlError>,
    },

    /// A graph snapshot write finished
    SnapshotWritten { result: Result<(), CrawlError> },
}

/// Cloneable handle for emitting events to the dispatcher
#[derive(Debug, Clone)]
pub struct EventSender(UnboundedSender<CrawlEvent>);

impl EventSender {
    /// Enqueues an event; events from one sender are handled in emission order
    pub fn emit(&self, event: CrawlEvent) {
        if let Err(e) = self.0.send(event) {
            tracing::debug!("Dispatcher stopped, dropping event: {:?}", e.0);
        }
    }
}

/// Creates the dispatcher's event channel
pub fn event_channel() -> (EventSender, UnboundedReceiver<CrawlEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender(tx), rx)
}
