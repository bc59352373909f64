//! Link graph module
//!
//! In-memory model of discovered pages, parent -> child edges, access counts,
//! and downloaded images, plus its JSON persistence.
//!
//! The graph records *discovered structure*: an edge is recorded for every
//! resolved anchor, whether or not the child is ever fetched.

mod persist;
mod record;

pub use persist::{load_graph, write_snapshot, SnapshotSchedule};
pub use record::{EdgeRecord, PageRecord, UrlSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Pages keyed by absolute URL
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkGraph {
    pages: BTreeMap<String, PageRecord>,

    /// Set by every mutation, cleared when a snapshot is taken
    #[serde(skip)]
    dirty: bool,
}

impl LinkGraph {
    /// Creates an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `parent` links to `child`
    ///
    /// The parent's page record is created with an access count of 1 or
    /// incremented, and `referrer` (the page that led to `parent`) joins its
    /// parent set. The edge inside the parent's children is created or
    /// incremented the same way and back-references `parent`.
    pub fn record_edge(&mut self, parent: &str, child: &str, referrer: Option<&str>) {
        let now = Utc::now();

        let page = self
            .pages
            .entry(parent.to_string())
            .and_modify(|page| page.touch(now))
            .or_insert_with(|| PageRecord::new(now));

        if let Some(referrer) = referrer {
            page.parents.insert(referrer);
        }

        page.children
            .entry(child.to_string())
            .and_modify(|edge| edge.touch(now))
            .or_insert_with(|| EdgeRecord::new(now))
            .parents
            .insert(parent);

        self.dirty = true;
        tracing::trace!("Recorded edge {} -> {}", parent, child);
    }

    /// Records a downloaded image referenced by `page`
    pub fn record_image(&mut self, page: &str, image_url: &str, local_path: &Path) {
        let record = self
            .pages
            .entry(page.to_string())
            .or_insert_with(|| PageRecord::new(Utc::now()));

        record
            .images
            .insert(image_url.to_string(), local_path.to_path_buf());

        self.dirty = true;
    }

    /// Returns the record for a page URL
    pub fn page(&self, url: &str) -> Option<&PageRecord> {
        self.pages.get(url)
    }

    /// Returns the edge `parent -> child`, if recorded
    pub fn edge(&self, parent: &str, child: &str) -> Option<&EdgeRecord> {
        self.pages.get(parent)?.children.get(child)
    }

    /// Iterates over all page records in URL order
    pub fn pages(&self) -> impl Iterator<Item = (&str, &PageRecord)> {
        self.pages.iter().map(|(url, page)| (url.as_str(), page))
    }

    /// Number of page records
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Whether the graph changed since the last snapshot
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Serializes the full graph as pretty-printed JSON and clears the dirty flag
    pub fn take_snapshot(&mut self) -> Result<String, serde_json::Error> {
        let json = self.to_json()?;
        self.dirty = false;
        Ok(json)
    }

    /// Serializes the full graph as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parses a graph from its JSON form
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
