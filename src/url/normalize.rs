use crate::url::domain::{extract_domain, strip_www};
use url::Url;

/// Hosts belonging to the target site or its CDNs; links to these are internal
pub const EXCLUDED_DOMAINS: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "googleapis.com",
    "googleusercontent.com",
    "gstatic.com",
    "google.com",
    "googlevideo.com",
];

/// Markers identifying a same-site redirect that wraps the real destination
const REDIRECT_MARKERS: &[&str] = &["/redirect?", "youtube.com/redirect"];

/// Query parameter carrying the wrapped destination
const REDIRECT_PARAM: &str = "q";

/// Base used to resolve relative redirect hrefs such as `/redirect?q=...`
const SITE_BASE: &str = "https://www.youtube.com/";

/// Returns true if the URL is a redirect indirection
pub fn is_redirect(url: &str) -> bool {
    REDIRECT_MARKERS.iter().any(|marker| url.contains(marker))
}

/// Recovers the destination wrapped in a redirect URL
///
/// The `q` parameter is percent-decoded once. Relative redirects are resolved
/// against the site root first.
///
/// # Examples
///
/// ```
/// use channel_links::url::extract_clean_url;
///
/// let clean = extract_clean_url(
///     "https://www.youtube.com/redirect?event=channel&q=https%3A%2F%2Facme.example%2Fshop",
/// );
/// assert_eq!(clean.as_deref(), Some("https://acme.example/shop"));
/// ```
pub fn extract_clean_url(redirect_url: &str) -> Option<String> {
    let parsed = match Url::parse(redirect_url) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(SITE_BASE).ok()?.join(redirect_url).ok()?
        }
        Err(e) => {
            tracing::debug!("Error parsing redirect URL {}: {}", redirect_url, e);
            return None;
        }
    };

    parsed
        .query_pairs()
        .find(|(key, _)| key == REDIRECT_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Validates that a URL is an absolute http(s) link off the target site
///
/// # Examples
///
/// ```
/// use channel_links::url::is_valid_external_url;
///
/// assert!(is_valid_external_url("https://acme.example/"));
/// assert!(!is_valid_external_url("https://www.youtube.com/@acme"));
/// assert!(!is_valid_external_url("mailto:hello@acme.example"));
/// ```
pub fn is_valid_external_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return false;
    }

    let Some(host) = extract_domain(&parsed) else {
        return false;
    };
    let host = strip_www(&host);

    !EXCLUDED_DOMAINS
        .iter()
        .any(|excluded| host.contains(excluded))
}

/// Turns a raw link URL into a clean external URL
///
/// Redirect indirections are unwrapped first; the result must then pass
/// [`is_valid_external_url`]. Returns `None` for anything else.
pub fn normalize_link(raw_url: &str) -> Option<String> {
    let raw_url = raw_url.trim();

    let candidate = if is_redirect(raw_url) {
        extract_clean_url(raw_url)?
    } else {
        raw_url.to_string()
    };

    if is_valid_external_url(&candidate) {
        Some(candidate)
    } else {
        None
    }
}
