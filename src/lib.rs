//! Channel-Links: resilient external link extraction for channel About pages
//!
//! This crate fetches the About page of each channel in a batch, recovers the
//! channel's external links from whichever embedded document shape the page
//! happens to use, and buckets them into a fixed set of social categories.
//! Fetching goes through an adaptive rate controller, a circuit breaker and an
//! optional result cache so a block-happy remote degrades the batch instead of
//! aborting it.

pub mod config;
pub mod crawler;
pub mod output;
pub mod parser;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Channel-Links operations
#[derive(Debug, Error)]
pub enum LinksError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Table error: {0}")]
    Table(#[from] output::TableError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Per-item fetch failures
///
/// Every variant is recoverable at the item boundary: the orchestrator turns
/// it into a row status and moves on to the next channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Invalid channel URL: {0}")]
    InvalidIdentifier(String),

    #[error("Page load timeout - about page may not be available ({url})")]
    Timeout { url: String },

    #[error("Blocked due to anti-bot measures - max retries exceeded ({url})")]
    Blocked { url: String },

    #[error("Circuit breaker open - request not attempted")]
    CircuitOpen,

    #[error("Fetch failed for {url}: {message}")]
    Source { url: String, message: String },
}

impl FetchError {
    /// Returns true if this failure should count against the circuit breaker
    ///
    /// Malformed input and calls the breaker itself rejected say nothing about
    /// the health of the remote.
    pub fn is_remote_failure(&self) -> bool {
        !matches!(self, Self::InvalidIdentifier(_) | Self::CircuitOpen)
    }
}

/// Result type alias for Channel-Links operations
pub type Result<T> = std::result::Result<T, LinksError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{BatchRunner, ChannelId, FetchClient};
pub use state::ItemStatus;
pub use url::{classify, normalize_link, CategorizedLinks, Category, ExtractedLink};
