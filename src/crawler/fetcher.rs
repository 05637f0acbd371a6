//! Fetch client for channel About pages
//!
//! This module handles one logical "fetch the About page of a channel"
//! operation, including:
//! - Validating the channel URL and deriving the About page URL
//! - Passing through the shared rate gate before every request
//! - Detecting block signals in the response
//! - A bounded retry after a block signal
//! - Running the document parser on the page

use crate::config::FetchConfig;
use crate::crawler::scheduler::RateController;
use crate::crawler::source::{describe_status, DocumentSource, SourceError};
use crate::parser::{parse_document, Extraction};
use crate::FetchError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Lower-cased page text fragments that mean the remote flagged us as a bot
const BLOCK_PHRASES: &[&str] = &["unusual traffic", "blocked", "captcha", "robot"];

/// A validated channel URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelId(String);

impl ChannelId {
    /// Parses a channel URL from an input cell
    ///
    /// Surrounding whitespace is trimmed. The URL must be an absolute http(s)
    /// URL.
    ///
    /// # Example
    ///
    /// ```
    /// use channel_links::ChannelId;
    ///
    /// let channel = ChannelId::parse(" https://www.youtube.com/@acme/ ").unwrap();
    /// assert_eq!(channel.about_url("/about"), "https://www.youtube.com/@acme/about");
    /// assert!(ChannelId::parse("youtube.com/@acme").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, FetchError> {
        let trimmed = raw.trim();

        let valid = Url::parse(trimmed)
            .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
            .unwrap_or(false);

        if !valid {
            return Err(FetchError::InvalidIdentifier(trimmed.to_string()));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URL of the channel's About page
    pub fn about_url(&self, suffix: &str) -> String {
        format!("{}{}", self.0.trim_end_matches('/'), suffix)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns true if the page text carries a bot-detection phrase
pub fn contains_block_signal(document: &str) -> bool {
    let lowered = document.to_lowercase();
    BLOCK_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}

/// Fetches About pages and extracts their links
pub struct FetchClient {
    source: Arc<dyn DocumentSource>,
    rate: Arc<RateController>,
    about_suffix: String,
    block_retry_delay: Duration,
    max_block_retries: u32,
}

impl FetchClient {
    /// Creates a fetch client
    ///
    /// # Arguments
    ///
    /// * `config` - Fetch settings (suffix, retry delay and count)
    /// * `source` - Where page text comes from
    /// * `rate` - The shared rate controller
    pub fn new(
        config: &FetchConfig,
        source: Arc<dyn DocumentSource>,
        rate: Arc<RateController>,
    ) -> Self {
        Self {
            source,
            rate,
            about_suffix: config.about_suffix.clone(),
            block_retry_delay: config.block_retry_delay(),
            max_block_retries: config.max_block_retries,
        }
    }

    /// Fetches a channel's About page and extracts its external links
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Block phrase in page, HTTP 403/429 | Report block, wait, retry once → Blocked |
    /// | Timeout | Immediate → Timeout |
    /// | Other HTTP or network error | Immediate → Source |
    /// | Page loaded | Report clean, parse |
    ///
    /// An empty link list is a successful result, not an error.
    pub async fn fetch_links(&self, channel: &ChannelId) -> Result<Extraction, FetchError> {
        let url = channel.about_url(&self.about_suffix);
        let mut retries = 0;

        loop {
            self.rate.wait_turn().await;
            tracing::debug!("Fetching {}", url);

            let outcome = self.source.fetch(&url).await;

            let blocked = match &outcome {
                Ok(document) => contains_block_signal(document),
                Err(e) => e.is_block_status(),
            };

            if blocked {
                self.rate.report_outcome(true);

                if retries < self.max_block_retries {
                    retries += 1;
                    tracing::warn!(
                        "Detected blocking on {}. Waiting {:.0}s before retry {}/{}",
                        url,
                        self.block_retry_delay.as_secs_f64(),
                        retries,
                        self.max_block_retries
                    );
                    tokio::time::sleep(self.block_retry_delay).await;
                    continue;
                }

                return Err(FetchError::Blocked { url });
            }

            return match outcome {
                Ok(document) => {
                    self.rate.report_outcome(false);
                    Ok(parse_document(&document))
                }
                Err(SourceError::Timeout) => Err(FetchError::Timeout { url }),
                Err(SourceError::Status { code }) => Err(FetchError::Source {
                    message: format!("HTTP {}", describe_status(code)),
                    url,
                }),
                Err(SourceError::Network(message)) => Err(FetchError::Source { url, message }),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitConfig;
    use crate::parser::ExtractionMethod;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses and records requested URLs
    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<String, SourceError>>>,
        requested: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<String, SourceError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requested: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DocumentSource for ScriptedSource {
        async fn fetch(&self, url: &str) -> Result<String, SourceError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(SourceError::Network("script exhausted".to_string())))
        }
    }

    fn create_test_client(source: Arc<ScriptedSource>) -> (FetchClient, Arc<RateController>) {
        let rate = Arc::new(RateController::new(&RateLimitConfig {
            min_delay_ms: 10,
            max_delay_ms: 100,
            block_pause_min_ms: 1_000,
            block_pause_max_ms: 1_000,
        }));
        let config = FetchConfig {
            block_retry_delay_ms: 5_000,
            ..FetchConfig::default()
        };
        (FetchClient::new(&config, source, Arc::clone(&rate)), rate)
    }

    fn channel() -> ChannelId {
        ChannelId::parse("https://www.youtube.com/@acme").unwrap()
    }

    const LINK_PAGE: &str = r#"<html><body><a class="channel-external-link" href="https://acme.example/">Acme</a></body></html>"#;

    #[test]
    fn test_channel_id_parse() {
        assert!(ChannelId::parse("https://www.youtube.com/@acme").is_ok());
        assert!(ChannelId::parse("http://youtube.com/c/acme").is_ok());

        assert!(matches!(
            ChannelId::parse("not a url"),
            Err(FetchError::InvalidIdentifier(_))
        ));
        assert!(ChannelId::parse("ftp://youtube.com/@acme").is_err());
        assert!(ChannelId::parse("").is_err());
    }

    #[test]
    fn test_about_url_strips_trailing_slashes() {
        let channel = ChannelId::parse("https://www.youtube.com/@acme//").unwrap();
        assert_eq!(channel.about_url("/about"), "https://www.youtube.com/@acme/about");
    }

    #[test]
    fn test_block_signal_detection() {
        assert!(contains_block_signal("Our systems have detected UNUSUAL TRAFFIC"));
        assert!(contains_block_signal("please solve this captcha"));
        assert!(!contains_block_signal("<html>hello</html>"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_fetch_parses_page() {
        let source = ScriptedSource::new(vec![Ok(LINK_PAGE.to_string())]);
        let (client, rate) = create_test_client(Arc::clone(&source));

        let extraction = client.fetch_links(&channel()).await.unwrap();

        assert_eq!(extraction.links[0].url, "https://acme.example/");
        assert!(matches!(extraction.method, ExtractionMethod::Dom { .. }));
        assert_eq!(source.requests(), ["https://www.youtube.com/@acme/about"]);
        assert_eq!(rate.snapshot().consecutive_failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_block_then_success_retries_once() {
        let source = ScriptedSource::new(vec![
            Ok("unusual traffic from your network".to_string()),
            Ok(LINK_PAGE.to_string()),
        ]);
        let (client, _rate) = create_test_client(Arc::clone(&source));

        let start = tokio::time::Instant::now();
        let extraction = client.fetch_links(&channel()).await.unwrap();

        assert!(!extraction.is_empty());
        assert_eq!(source.requests().len(), 2);
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_block_gives_up() {
        let source = ScriptedSource::new(vec![
            Ok("captcha".to_string()),
            Err(SourceError::Status { code: 429 }),
            Ok(LINK_PAGE.to_string()),
        ]);
        let (client, rate) = create_test_client(Arc::clone(&source));

        let result = client.fetch_links(&channel()).await;

        assert!(matches!(result, Err(FetchError::Blocked { .. })));
        assert_eq!(source.requests().len(), 2);
        assert_eq!(rate.snapshot().consecutive_failures, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_not_retried() {
        let source = ScriptedSource::new(vec![Err(SourceError::Timeout), Ok(LINK_PAGE.to_string())]);
        let (client, _rate) = create_test_client(Arc::clone(&source));

        let result = client.fetch_links(&channel()).await;

        assert!(matches!(result, Err(FetchError::Timeout { .. })));
        assert_eq!(source.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_http_error_is_source_failure() {
        let source = ScriptedSource::new(vec![Err(SourceError::Status { code: 404 })]);
        let (client, _rate) = create_test_client(Arc::clone(&source));

        match client.fetch_links(&channel()).await {
            Err(FetchError::Source { message, .. }) => assert_eq!(message, "HTTP 404 Not Found"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_without_links_is_ok() {
        let source = ScriptedSource::new(vec![Ok("<html><body>nothing</body></html>".to_string())]);
        let (client, _rate) = create_test_client(Arc::clone(&source));

        let extraction = client.fetch_links(&channel()).await.unwrap();
        assert!(extraction.is_empty());
        assert_eq!(extraction.method, ExtractionMethod::NotFound);
    }
}
