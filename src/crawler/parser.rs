//! HTML parser for extracting link and image references
//!
//! Values are returned raw, in document order, exactly as written in the
//! markup. Resolution against the page URL happens per item in the page
//! processor so one bad reference cannot spoil the rest.

use scraper::{Html, Selector};

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// `href` of every `<a>` element that has one
    pub anchors: Vec<String>,

    /// `src` of every `<img>` element that has one
    pub images: Vec<String>,
}

/// Parses HTML content and extracts raw anchor hrefs and image srcs
///
/// # Example
///
/// ```
/// use polite_crawler::crawler::parse_html;
///
/// let html = r#"<html><head><title>Test</title></head>
///     <body><a href="/page">Link</a><img src="logo.png"></body></html>"#;
/// let parsed = parse_html(html);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.anchors, vec!["/page"]);
/// assert_eq!(parsed.images, vec!["logo.png"]);
/// ```
pub fn parse_html(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        anchors: extract_attribute(&document, "a[href]", "href"),
        images: extract_attribute(&document, "img[src]", "src"),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Collects one attribute from every element matching `selector`
fn extract_attribute(document: &Html, selector: &str, attribute: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attribute))
        .map(str::to_string)
        .collect()
}
