//! Document parser for recovering channel links from About pages
//!
//! The About page embeds its data in one of several incompatible shapes, and
//! the shape changes without notice. Extraction therefore runs an ordered list
//! of strategies and stops at the first one that produces at least one usable
//! external link:
//!
//! 1. Structured data: the embedded `ytInitialData` JSON blob
//! 2. DOM selectors: rendered link elements
//! 3. Text patterns: bare URLs anywhere in the page
//!
//! Each strategy yields [`RawLinkRecord`]s whose URLs may still be redirect
//! indirections; [`parse_document`] runs them through the link normalizer.

mod patterns;
mod records;
mod selectors;
mod structured;

pub use records::{resolve_record, RecordShape};
pub use structured::{find_link_container, EmbeddedData, JsonSource};

use crate::url::{normalize_link, ExtractedLink};
use serde::Serialize;
use std::fmt;

/// A link as found in the document, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLinkRecord {
    /// Display title (a placeholder when the document had none)
    pub title: String,

    /// Link target, possibly a same-site redirect
    pub url: String,

    /// Which document shape the record was recovered from
    pub shape: RecordShape,
}

/// Which strategy produced the links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExtractionMethod {
    /// A primary `ytInitialData` assignment pattern
    EmbeddedJson,

    /// `ytInitialData` nested inside a `ytcfg` block
    AlternativeJson,

    /// Rendered link elements matched by a CSS selector
    Dom { selector: &'static str },

    /// Bare URL regexes over the raw text
    TextPattern,

    /// Every strategy came up empty
    NotFound,
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmbeddedJson => write!(f, "Success (Enhanced JSON method)"),
            Self::AlternativeJson => write!(f, "Success (Alternative JSON method)"),
            Self::Dom { selector } => write!(f, "Success (DOM method with {})", selector),
            Self::TextPattern => write!(f, "Success (Regex extraction method)"),
            Self::NotFound => write!(f, "No links found with any method"),
        }
    }
}

/// Links recovered from one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub links: Vec<ExtractedLink>,
    pub method: ExtractionMethod,
}

impl Extraction {
    /// An extraction where no strategy found anything
    pub fn not_found() -> Self {
        Self {
            links: Vec::new(),
            method: ExtractionMethod::NotFound,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Human-readable outcome for the row status
    pub fn message(&self) -> String {
        self.method.to_string()
    }
}

/// Returns true if at least one record survives normalization
pub(crate) fn has_external_link(records: &[RawLinkRecord]) -> bool {
    records.iter().any(|r| normalize_link(&r.url).is_some())
}

/// Runs the extraction strategies in priority order
///
/// Returns the raw records of the first strategy that yields a usable external
/// link, together with the strategy label. Never fails: a document nothing
/// matches produces an empty list and [`ExtractionMethod::NotFound`].
pub fn extract_raw_links(document: &str) -> (Vec<RawLinkRecord>, ExtractionMethod) {
    if let Some((records, method)) = structured::extract_from_embedded_data(document) {
        tracing::debug!("Structured data yielded {} records", records.len());
        return (records, method);
    }

    if let Some((records, selector)) = selectors::extract_from_dom(document) {
        tracing::debug!("Selector '{}' yielded {} records", selector, records.len());
        return (records, ExtractionMethod::Dom { selector });
    }

    if let Some(records) = patterns::extract_from_text(document) {
        tracing::debug!("Text patterns yielded {} records", records.len());
        return (records, ExtractionMethod::TextPattern);
    }

    (Vec::new(), ExtractionMethod::NotFound)
}

/// Extracts validated external links from an About page document
///
/// # Example
///
/// ```
/// use channel_links::parser::{parse_document, ExtractionMethod};
///
/// let html = r#"<html><body>
///     <a href="/redirect?q=https%3A%2F%2Facme.example%2F">acme.example</a>
/// </body></html>"#;
/// let extraction = parse_document(html);
/// assert_eq!(extraction.links[0].url, "https://acme.example/");
/// assert!(matches!(extraction.method, ExtractionMethod::Dom { .. }));
/// ```
pub fn parse_document(document: &str) -> Extraction {
    let (records, method) = extract_raw_links(document);

    let links: Vec<ExtractedLink> = records
        .into_iter()
        .filter_map(|record| {
            let url = normalize_link(&record.url)?;
            Some(ExtractedLink {
                title: record.title,
                url,
            })
        })
        .collect();

    if links.is_empty() {
        return Extraction::not_found();
    }

    Extraction { links, method }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_model_link(title: &str, destination: &str) -> String {
        let encoded: String =
            url::form_urlencoded::byte_serialize(destination.as_bytes()).collect();
        format!(
            r#"{{"channelExternalLinkViewModel":{{"title":{{"content":"{}"}},"link":{{"content":"x","commandRuns":[{{"onTap":{{"innertubeCommand":{{"urlEndpoint":{{"url":"https://www.youtube.com/redirect?event=channel&q={}"}}}}}}}}]}}}}}}"#,
            title, encoded
        )
    }

    fn about_page(links: &[String]) -> String {
        format!(
            r#"<html><head><script>var ytInitialData = {{"contents":{{"aboutChannelViewModel":{{"description":"hi","links":[{}]}}}}}};</script></head><body></body></html>"#,
            links.join(",")
        )
    }

    #[test]
    fn test_structured_data_wins() {
        let html = about_page(&[
            view_model_link("Facebook", "https://www.facebook.com/acme"),
            view_model_link("Shop", "https://shop.acme.example/"),
        ]);

        let extraction = parse_document(&html);

        assert_eq!(extraction.method, ExtractionMethod::EmbeddedJson);
        assert_eq!(extraction.links.len(), 2);
        assert_eq!(extraction.links[0].title, "Facebook");
        assert_eq!(extraction.links[0].url, "https://www.facebook.com/acme");
        assert_eq!(extraction.links[1].url, "https://shop.acme.example/");
    }

    #[test]
    fn test_malformed_structured_data_falls_through_to_dom() {
        let html = r#"<html><head>
            <script>var ytInitialData = {"contents": {broken json};</script>
            </head><body>
            <a href="https://www.youtube.com/redirect?q=https%3A%2F%2Facme.example%2F">Site</a>
            </body></html>"#;

        let extraction = parse_document(html);

        assert_eq!(
            extraction.method,
            ExtractionMethod::Dom {
                selector: r#"a[href*="/redirect?"]"#
            }
        );
        assert_eq!(extraction.links.len(), 1);
        assert_eq!(extraction.links[0].url, "https://acme.example/");
        assert_eq!(extraction.links[0].title, "Site");
    }

    #[test]
    fn test_text_patterns_are_last_resort() {
        let html = "<html><body><p>Find us at https://www.instagram.com/acme.co today</p></body></html>";

        let extraction = parse_document(html);

        assert_eq!(extraction.method, ExtractionMethod::TextPattern);
        assert!(extraction
            .links
            .iter()
            .any(|l| l.url == "https://www.instagram.com/acme.co"));
        assert!(extraction.links.iter().all(|l| l.title == "Extracted Link"));
    }

    #[test]
    fn test_nothing_found() {
        let extraction = parse_document("<html><body>No links here</body></html>");
        assert!(extraction.is_empty());
        assert_eq!(extraction.method, ExtractionMethod::NotFound);
        assert_eq!(extraction.message(), "No links found with any method");
    }

    #[test]
    fn test_only_internal_links_found_is_not_found() {
        let html = r#"<html><body><a href="https://www.youtube.com/@acme/videos">Videos</a></body></html>"#;
        let extraction = parse_document(html);
        assert!(extraction.is_empty());
    }

    #[test]
    fn test_method_labels() {
        assert_eq!(
            ExtractionMethod::EmbeddedJson.to_string(),
            "Success (Enhanced JSON method)"
        );
        assert_eq!(
            ExtractionMethod::Dom {
                selector: ".channel-external-link"
            }
            .to_string(),
            "Success (DOM method with .channel-external-link)"
        );
    }
}
