//! DOM strategy: rendered link elements
//!
//! Selectors are tried in order. The first one whose elements yield at least
//! one usable external link decides the result.

use crate::parser::{has_external_link, RawLinkRecord, RecordShape};
use crate::url::is_redirect;
use scraper::{ElementRef, Html, Selector};

/// Link selectors, most specific first
const LINK_SELECTORS: &[&str] = &[
    r#"a[href*="/redirect?"]"#,
    r#"a[href*="youtube.com/redirect"]"#,
    r#"[data-target-new-window="true"]"#,
    ".channel-external-link",
    ".ytd-channel-external-link-view-model",
    r#"yt-formatted-string a[href^="http"]"#,
];

/// Elements considered per selector
const MAX_ELEMENTS_PER_SELECTOR: usize = 10;

/// Runs the DOM strategy
///
/// # Returns
///
/// The records from the winning selector and the selector itself, or `None`
/// if no selector produced a usable link.
pub(crate) fn extract_from_dom(document: &str) -> Option<(Vec<RawLinkRecord>, &'static str)> {
    let html = Html::parse_document(document);

    for &selector_text in LINK_SELECTORS {
        let selector = match Selector::parse(selector_text) {
            Ok(selector) => selector,
            Err(e) => {
                tracing::warn!("Skipping unparseable selector {}: {:?}", selector_text, e);
                continue;
            }
        };

        let records: Vec<RawLinkRecord> = html
            .select(&selector)
            .take(MAX_ELEMENTS_PER_SELECTOR)
            .filter_map(element_record)
            .collect();

        if has_external_link(&records) {
            return Some((records, selector_text));
        }
    }

    None
}

fn element_record(element: ElementRef<'_>) -> Option<RawLinkRecord> {
    let href = element.value().attr("href")?.trim();

    let keep = is_redirect(href) || (href.starts_with("http") && !href.contains("youtube.com"));
    if !keep {
        return None;
    }

    Some(RawLinkRecord {
        title: element_title(&element),
        url: href.to_string(),
        shape: RecordShape::Generic,
    })
}

/// Visible text, then `aria-label`, then `title`, then a placeholder
fn element_title(element: &ElementRef<'_>) -> String {
    let text = element.text().collect::<String>();
    let text = text.trim();
    if !text.is_empty() {
        return text.to_string();
    }

    ["aria-label", "title"]
        .iter()
        .filter_map(|attr| element.value().attr(attr))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or("Link")
        .to_string()
}
