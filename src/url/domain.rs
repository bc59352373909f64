use url::Url;

/// Returns the robots.txt location governing a URL
///
/// Scheme, host, and explicit port are kept: `http://a.com:8080/x` and
/// `https://a.com/x` are different robots hosts.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use polite_crawler::url::robots_url;
///
/// let url = Url::parse("https://Example.com/path?q=1").unwrap();
/// assert_eq!(robots_url(&url), "https://example.com/robots.txt");
/// ```
pub fn robots_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{}:{}/robots.txt", url.scheme(), host, port),
        None => format!("{}://{}/robots.txt", url.scheme(), host),
    }
}

/// Extracts the lowercase host from a URL, if any
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
