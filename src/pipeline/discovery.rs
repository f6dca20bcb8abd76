//! Image reference discovery
//!
//! Scans document text for remote image references:
//! - Markdown images: `![alt](https://...)`
//! - HTML `<img src="https://...">` tags, only consulted when the document
//!   contains no markdown images at all

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;

const MARKDOWN_IMAGE_PATTERN: &str = r"!\[.*?\]\((https?://[^)]+)\)";

fn markdown_image_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(MARKDOWN_IMAGE_PATTERN).expect("markdown image pattern is a valid regex")
    })
}

/// Extracts remote image URLs from a markdown or HTML document
///
/// URLs are returned in document order, duplicates included, exactly as they
/// appear in the text (query strings are kept).
///
/// # Example
///
/// ```
/// use montage_creator::pipeline::extract_image_urls;
///
/// let doc = "Intro ![cat](https://example.com/cat.png) and ![dog](http://example.com/dog.jpg?s=2)";
/// assert_eq!(
///     extract_image_urls(doc),
///     vec!["https://example.com/cat.png", "http://example.com/dog.jpg?s=2"]
/// );
/// ```
pub fn extract_image_urls(content: &str) -> Vec<String> {
    let markdown = extract_markdown_images(content);
    if !markdown.is_empty() {
        return markdown;
    }

    tracing::debug!("No markdown images found, scanning for <img> tags");
    extract_html_images(content)
}

/// Extracts targets of markdown image syntax pointing at http(s) URLs
fn extract_markdown_images(content: &str) -> Vec<String> {
    markdown_image_regex()
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Extracts `src` attributes of `<img>` tags pointing at http(s) URLs
fn extract_html_images(content: &str) -> Vec<String> {
    let document = Html::parse_fragment(content);
    let Ok(selector) = Selector::parse("img[src]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("src"))
        .filter(|src| src.starts_with("http://") || src.starts_with("https://"))
        .map(str::to_string)
        .collect()
}
