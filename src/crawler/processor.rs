//! Page processing: fetch one page and turn its markup into absolute URLs

use crate::crawler::{fetch_url, parse_html};
use crate::url::resolve_reference;
use crate::{CrawlError, Result, UrlError};
use reqwest::Client;
use std::fmt;
use url::Url;

/// Which element a reference came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Anchor,
    Image,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anchor => f.write_str("anchor"),
            Self::Image => f.write_str("image"),
        }
    }
}

/// A reference that could not be resolved
#[derive(Debug)]
pub struct ItemFailure {
    pub element: ElementKind,
    pub reference: String,
    pub error: UrlError,
}

impl ItemFailure {
    pub fn into_error(self) -> CrawlError {
        CrawlError::UrlError(self.error)
    }
}

/// Absolute URLs extracted from one page, in document order
#[derive(Debug, Default)]
pub struct ExtractedPage {
    pub title: Option<String>,
    pub anchors: Vec<Url>,
    pub images: Vec<Url>,
    pub failures: Vec<ItemFailure>,
}

/// Fetches pages and extracts their references
#[derive(Debug, Clone)]
pub struct PageProcessor {
    client: Client,
}

impl PageProcessor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetches `url`, returning the body when it is HTML
    pub async fn fetch(&self, url: &Url) -> Result<Option<String>> {
        tracing::debug!("Fetching {}", url);
        fetch_url(&self.client, url.as_str())
            .await
            .into_html(url.as_str())
    }

    /// Resolves every anchor and image reference against `page_url`
    ///
    /// A reference that fails to resolve is recorded in `failures` and does
    /// not affect the others.
    pub fn extract(page_url: &Url, html: &str) -> ExtractedPage {
        let parsed = parse_html(html);
        let mut page = ExtractedPage {
            title: parsed.title,
            ..ExtractedPage::default()
        };

        for (element, references) in [
            (ElementKind::Anchor, parsed.anchors),
            (ElementKind::Image, parsed.images),
        ] {
            for reference in references {
                match resolve_reference(page_url, &reference) {
                    Ok(url) => match element {
                        ElementKind::Anchor => page.anchors.push(url),
                        ElementKind::Image => page.images.push(url),
                    },
                    Err(error) => page.failures.push(ItemFailure {
                        element,
                        reference,
                        error,
                    }),
                }
            }
        }

        page
    }
}
