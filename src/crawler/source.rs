//! Document sources: where About page text comes from
//!
//! The fetch client only needs "raw document text for a URL". The production
//! source issues plain HTTP requests through the session pool; tests can plug
//! in anything that implements [`DocumentSource`].

use crate::crawler::session::SessionPool;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Transport-level failures of a document source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP {code}")]
    Status { code: u16 },

    #[error("network error: {0}")]
    Network(String),
}

impl SourceError {
    /// Returns true for status codes the remote uses to throttle or block
    pub fn is_block_status(&self) -> bool {
        matches!(self, Self::Status { code: 403 | 429 })
    }
}

/// Anything that can produce the raw text of a page
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, SourceError>;
}

/// HTTP document source backed by a session pool
///
/// Two independent timeouts apply: `timeout` bounds the whole request, and
/// `readiness_timeout` separately bounds reading the body once the response
/// headers have arrived.
pub struct HttpSource {
    pool: Arc<SessionPool>,
    timeout: Duration,
    readiness_timeout: Duration,
}

impl HttpSource {
    pub fn new(pool: Arc<SessionPool>, timeout: Duration, readiness_timeout: Duration) -> Self {
        Self {
            pool,
            timeout,
            readiness_timeout,
        }
    }

    async fn get(&self, client: &reqwest::Client, url: &str) -> Result<String, SourceError> {
        let response = client.get(url).send().await.map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                code: status.as_u16(),
            });
        }

        match tokio::time::timeout(self.readiness_timeout, response.text()).await {
            Ok(body) => body.map_err(classify_reqwest_error),
            Err(_) => Err(SourceError::Timeout),
        }
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<String, SourceError> {
        let mut pooled = self.pool.acquire().await?;

        let Some(session) = pooled.session() else {
            return Err(SourceError::Network("no session available".to_string()));
        };
        let session_id = session.id;
        let client = session.client().clone();

        let result = match tokio::time::timeout(self.timeout, self.get(&client, url)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout),
        };

        if let Err(e) = &result {
            if matches!(e, SourceError::Network(_)) || e.is_block_status() {
                tracing::debug!("Session {} burnt by {}: {}", session_id, url, e);
                pooled.discard();
            }
        }

        result
    }
}

fn classify_reqwest_error(error: reqwest::Error) -> SourceError {
    if error.is_timeout() {
        SourceError::Timeout
    } else if let Some(status) = error.status() {
        SourceError::Status {
            code: status.as_u16(),
        }
    } else {
        SourceError::Network(error.to_string())
    }
}

/// Status codes reported as block signals, for log messages
pub fn describe_status(code: u16) -> String {
    StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .map(|reason| format!("{} {}", code, reason))
        .unwrap_or_else(|| code.to_string())
}
