//! Image download cache
//!
//! Images are stored under one directory, one file per distinct absolute
//! URL, named by the MD5 hex digest of the URL string. A URL that already has
//! a record resolves to its path without I/O; a URL whose download is in
//! flight queues the requesting page instead of downloading again. Failures
//! are never cached, so a later reference may retry.

mod download;

pub use download::download_image;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Result of looking up an image URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLookup {
    /// Already downloaded to this path
    Cached(PathBuf),
    /// Not known yet; the caller must download to this path
    Download(PathBuf),
    /// A download for this URL is already running
    Pending,
}

/// Content-addressed image cache for one crawl
#[derive(Debug)]
pub struct ImageCache {
    dir: PathBuf,
    records: HashMap<String, PathBuf>,
    /// Image URL -> pages waiting for its download
    in_flight: HashMap<String, Vec<String>>,
}

impl ImageCache {
    /// Creates an empty cache storing files under `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            records: HashMap::new(),
            in_flight: HashMap::new(),
        }
    }

    /// Local file path for an image URL
    pub fn local_path(&self, image_url: &str) -> PathBuf {
        self.dir.join(content_address(image_url))
    }

    /// Looks up `image_url` on behalf of `page_url`
    ///
    /// `Download` and `Pending` register `page_url` as waiting for the
    /// outcome, which [`ImageCache::complete`] hands back.
    pub fn lookup(&mut self, image_url: &str, page_url: &str) -> ImageLookup {
        if let Some(path) = self.records.get(image_url) {
            return ImageLookup::Cached(path.clone());
        }

        if let Some(waiters) = self.in_flight.get_mut(image_url) {
            waiters.push(page_url.to_string());
            return ImageLookup::Pending;
        }

        self.in_flight
            .insert(image_url.to_string(), vec![page_url.to_string()]);
        ImageLookup::Download(self.local_path(image_url))
    }

    /// Finishes a download started by [`ImageCache::lookup`]
    ///
    /// `downloaded` is the written path on success, `None` on failure. Returns
    /// the pages that were waiting on this URL.
    pub fn complete(&mut self, image_url: &str, downloaded: Option<PathBuf>) -> Vec<String> {
        if let Some(path) = downloaded {
            self.records.insert(image_url.to_string(), path);
        }

        self.in_flight.remove(image_url).unwrap_or_default()
    }

    /// Returns the local path of a downloaded image
    pub fn get(&self, image_url: &str) -> Option<&Path> {
        self.records.get(image_url).map(PathBuf::as_path)
    }

    /// Number of downloaded images
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// MD5 hex digest of a URL string, used as the image file name
pub fn content_address(url: &str) -> String {
    format!("{:x}", md5::compute(url.as_bytes()))
}
