//! Text strategy: bare URLs anywhere in the page source

use crate::parser::{RawLinkRecord, RecordShape};
use crate::url::is_valid_external_url;
use regex::Regex;
use std::sync::OnceLock;

const URL_PATTERNS: &[&str] = &[
    r"(?i)https?://(?:www\.)?(?:facebook|instagram|twitter|linkedin|tiktok)\.com/[\w\-\.]+",
    r"(?i)https?://(?:www\.)?[\w\-]+\.(?:com|org|net|co|io)/[\w\-\.]*",
];

/// Matches kept per pattern
const MAX_MATCHES_PER_PATTERN: usize = 5;

const EXTRACTED_TITLE: &str = "Extracted Link";

fn url_patterns() -> &'static [Regex] {
    static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();

    COMPILED.get_or_init(|| {
        URL_PATTERNS
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::error!("Invalid URL pattern {}: {}", pattern, e);
                    None
                }
            })
            .collect()
    })
}

/// Runs the text strategy
///
/// Every pattern contributes up to five valid matches; the results are
/// concatenated, so the same URL may appear once per pattern.
pub(crate) fn extract_from_text(document: &str) -> Option<Vec<RawLinkRecord>> {
    let records: Vec<RawLinkRecord> = url_patterns()
        .iter()
        .flat_map(|re| {
            re.find_iter(document)
                .take(MAX_MATCHES_PER_PATTERN)
                .map(|m| m.as_str())
                .filter(|url| is_valid_external_url(url))
                .map(|url| RawLinkRecord {
                    title: EXTRACTED_TITLE.to_string(),
                    url: url.to_string(),
                    shape: RecordShape::Generic,
                })
        })
        .collect();

    if records.is_empty() {
        None
    } else {
        Some(records)
    }
}
