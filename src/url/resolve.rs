use crate::{UrlError, UrlResult};
use url::Url;

/// Resolves a raw `href`/`src` value against the page it was found on
///
/// # Resolution Rules
///
/// 1. Trim surrounding whitespace; reject empty references
/// 2. Join against `base` using standard URL resolution
/// 3. Drop the fragment, so `#section` links resolve to the page itself
/// 4. Reject anything that is not HTTP or HTTPS after resolution
///
/// # Examples
///
/// ```
/// use polite_crawler::url::resolve_reference;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/docs/index.html").unwrap();
/// let url = resolve_reference(&base, "../about#team").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/about");
/// ```
pub fn resolve_reference(base: &Url, reference: &str) -> UrlResult<Url> {
    let reference = reference.trim();

    if reference.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut url = base
        .join(reference)
        .map_err(|e| UrlError::Parse(format!("{}: {}", reference, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost(url.to_string()));
    }

    url.set_fragment(None);

    Ok(url)
}

/// Parses an absolute seed URL with the same rules as discovered links
pub fn parse_absolute(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    resolve_reference(&url, url.as_str())
}
