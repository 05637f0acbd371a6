//! Structured-data strategy: the embedded `ytInitialData` JSON blob
//!
//! The blob is assigned to a variable in an inline script, but the exact form
//! of the assignment has varied over time. Each known form is tried in order.
//! A pattern only locates the opening brace; the value itself is read with a
//! streaming JSON parse from there, so nested objects survive even when the
//! pattern's own capture would stop at the first closing brace. A form that
//! matches but does not parse is skipped.

use crate::parser::records::resolve_record;
use crate::parser::{has_external_link, ExtractionMethod, RawLinkRecord};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Keys whose value is an object that may hold the channel's link list
const CONTAINER_KEYS: &[&str] = &[
    "aboutChannelViewModel",
    "channelMetadataRenderer",
    "c4TabbedHeaderRenderer",
];

/// Keys under a container that hold the link array, checked in order
const LINK_LIST_KEYS: &[&str] = &["links", "headerLinks", "customLinks"];

/// Maximum nesting depth the container search descends into
const MAX_SEARCH_DEPTH: usize = 128;

/// Where in the page a JSON blob was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonSource {
    /// A direct `ytInitialData` assignment
    Primary,
    /// `ytInitialData` embedded in a `ytcfg` configuration block
    Alternative,
}

impl JsonSource {
    fn method(self) -> ExtractionMethod {
        match self {
            Self::Primary => ExtractionMethod::EmbeddedJson,
            Self::Alternative => ExtractionMethod::AlternativeJson,
        }
    }
}

/// A successfully parsed embedded JSON blob
#[derive(Debug, Clone)]
pub struct EmbeddedData {
    pub source: JsonSource,
    pub pattern: &'static str,
    pub data: Value,
}

const EMBED_PATTERNS: &[(JsonSource, &str)] = &[
    (JsonSource::Primary, r#"(?s)var ytInitialData = (\{.*?\});</script>"#),
    (JsonSource::Primary, r#"(?s)window\["ytInitialData"\] = (\{.*?\});"#),
    (JsonSource::Primary, r#"(?s)ytInitialData\s*=\s*(\{.*?\});"#),
    (JsonSource::Primary, r#"(?s)ytInitialData\[""\]\s*=\s*(\{.*?\});"#),
    (JsonSource::Primary, r#"(?s)window\.ytInitialData\s*=\s*(\{.*?\});"#),
    (JsonSource::Primary, r#"(?s)ytInitialData:\s*(\{.*?\}),"#),
    (
        JsonSource::Alternative,
        r#"(?s)window\["ytcfg"\]\.d\(\)\.CLIENT_NAME = "WEB".*?ytInitialData["']?\s*:\s*(\{.*?\})"#,
    ),
    (
        JsonSource::Alternative,
        r#"(?s)ytcfg\.set\s*\(\s*\{\s*['"]EXPERIMENT_FLAGS['"].*?ytInitialData['"]?\s*:\s*(\{.*?\})"#,
    ),
];

fn embed_patterns() -> &'static [(JsonSource, &'static str, Regex)] {
    static COMPILED: OnceLock<Vec<(JsonSource, &'static str, Regex)>> = OnceLock::new();

    COMPILED.get_or_init(|| {
        EMBED_PATTERNS
            .iter()
            .filter_map(|(source, pattern)| match Regex::new(pattern) {
                Ok(re) => Some((*source, *pattern, re)),
                Err(e) => {
                    tracing::error!("Invalid embed pattern {}: {}", pattern, e);
                    None
                }
            })
            .collect()
    })
}

/// Yields every embedded JSON blob that parses, in pattern priority order
///
/// Only the first match of each pattern is considered.
pub fn embedded_data(document: &str) -> impl Iterator<Item = EmbeddedData> + '_ {
    embed_patterns()
        .iter()
        .filter_map(move |(source, pattern, re)| {
            let start = re.captures(document)?.get(1)?.start();

            match read_json_value(&document[start..]) {
                Ok(data) => Some(EmbeddedData {
                    source: *source,
                    pattern,
                    data,
                }),
                Err(e) => {
                    tracing::debug!("Embedded JSON for pattern {} did not parse: {}", pattern, e);
                    None
                }
            }
        })
}

/// Parses exactly one JSON value from the front of `text`, ignoring the rest
fn read_json_value(text: &str) -> serde_json::Result<Value> {
    let mut stream = serde_json::Deserializer::from_str(text).into_iter::<Value>();

    match stream.next() {
        Some(result) => result,
        None => serde_json::from_str(""),
    }
}

/// Finds the first non-empty link array held by a known container key
///
/// Objects and arrays are both visited, in document order. The search stops at
/// the first hit, so a document carrying both a legacy and a current container
/// resolves to whichever comes first.
pub fn find_link_container(data: &Value) -> Option<&[Value]> {
    visit(data, 0)
}

fn visit(value: &Value, depth: usize) -> Option<&[Value]> {
    if depth > MAX_SEARCH_DEPTH {
        return None;
    }

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if CONTAINER_KEYS.contains(&key.as_str()) {
                    if let Some(links) = container_links(child) {
                        return Some(links);
                    }
                }

                if let Some(found) = visit(child, depth + 1) {
                    return Some(found);
                }
            }
            None
        }
        Value::Array(items) => items.iter().find_map(|item| visit(item, depth + 1)),
        _ => None,
    }
}

/// The link array of a container node, if it has a non-empty one
///
/// The first link key present decides; later keys are not consulted.
fn container_links(container: &Value) -> Option<&[Value]> {
    let map = container.as_object()?;

    LINK_LIST_KEYS
        .iter()
        .find_map(|key| map.get(*key))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .filter(|links| !links.is_empty())
}

/// Runs the structured-data strategy
pub(crate) fn extract_from_embedded_data(
    document: &str,
) -> Option<(Vec<RawLinkRecord>, ExtractionMethod)> {
    for embedded in embedded_data(document) {
        let Some(items) = find_link_container(&embedded.data) else {
            tracing::debug!("No link container under pattern {}", embedded.pattern);
            continue;
        };

        let records: Vec<RawLinkRecord> = items.iter().filter_map(resolve_record).collect();

        if has_external_link(&records) {
            return Some((records, embedded.source.method()));
        }
    }

    None
}
