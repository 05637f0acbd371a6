use crate::parser::RawLinkRecord;
use serde_json::{Map, Value};

const VIEW_MODEL_KEY: &str = "channelExternalLinkViewModel";
const VIEW_MODEL_TITLE: &str = "/title/content";
const VIEW_MODEL_URL: &str = "/link/commandRuns/0/onTap/innertubeCommand/urlEndpoint/url";

const NAVIGATION_KEY: &str = "navigationEndpoint";
const NAVIGATION_TITLE: &str = "/text/simpleText";
const NAVIGATION_URL: &str = "/navigationEndpoint/urlEndpoint/url";

/// Title keys probed by the generic shape, in order
const GENERIC_TITLE_KEYS: &[&str] = &["content", "simpleText", "text", "title"];

/// URL keys probed by the generic shape, in order
const GENERIC_URL_KEYS: &[&str] = &["url", "href"];

const MAX_GENERIC_DEPTH: usize = 32;

/// The shape a link entry was recognised as
///
/// Shapes are checked in declaration order and the first whose discriminating
/// key is present is committed to, even if its URL path turns out to be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordShape {
    /// `channelExternalLinkViewModel` wrapper (current layout)
    ViewModel,
    /// Plain `title` and `url` keys
    Flat,
    /// `navigationEndpoint.urlEndpoint` (older header links)
    NavigationEndpoint,
    /// Anything else: first title-like and first url-like string found
    Generic,
}

impl RecordShape {
    fn detect(entry: &Map<String, Value>) -> Self {
        if entry.contains_key(VIEW_MODEL_KEY) {
            Self::ViewModel
        } else if entry.contains_key("title") && entry.contains_key("url") {
            Self::Flat
        } else if entry.contains_key(NAVIGATION_KEY) {
            Self::NavigationEndpoint
        } else {
            Self::Generic
        }
    }
}

/// Turns one entry of a link array into a raw record
///
/// Returns `None` when the entry is not an object or its shape carries no URL.
pub fn resolve_record(entry: &Value) -> Option<RawLinkRecord> {
    let map = entry.as_object()?;
    let shape = RecordShape::detect(map);

    let (title, url) = match shape {
        RecordShape::ViewModel => {
            let inner = &map[VIEW_MODEL_KEY];
            (
                pointer_str(inner, VIEW_MODEL_TITLE).unwrap_or("No Title").to_string(),
                pointer_str(inner, VIEW_MODEL_URL)?.to_string(),
            )
        }
        RecordShape::Flat => (text_of(&map["title"]), map["url"].as_str()?.to_string()),
        RecordShape::NavigationEndpoint => (
            pointer_str(entry, NAVIGATION_TITLE).unwrap_or("Link").to_string(),
            pointer_str(entry, NAVIGATION_URL)?.to_string(),
        ),
        RecordShape::Generic => (
            find_string(map, GENERIC_TITLE_KEYS, 0).unwrap_or("Link").to_string(),
            find_string(map, GENERIC_URL_KEYS, 0)?.to_string(),
        ),
    };

    if url.is_empty() {
        return None;
    }

    Some(RawLinkRecord { title, url, shape })
}

fn pointer_str<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Depth-first search for the first string under any of `keys`
///
/// At each object the keys are checked directly before descending into child
/// objects. Arrays are not entered.
fn find_string<'a>(map: &'a Map<String, Value>, keys: &[&str], depth: usize) -> Option<&'a str> {
    if depth > MAX_GENERIC_DEPTH {
        return None;
    }

    if let Some(found) = keys
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
    {
        return Some(found);
    }

    map.values()
        .filter_map(Value::as_object)
        .find_map(|child| find_string(child, keys, depth + 1))
}
