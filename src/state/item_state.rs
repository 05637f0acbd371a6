/// Item status definitions for tracking batch progress
///
/// This module defines the outcome each input row can end up with.
use crate::FetchError;
use serde::Serialize;
use std::fmt;

/// Represents the final outcome of one channel in a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    // ===== Success States =====
    /// Links were extracted and categorized
    Success,

    /// The page was fetched but no strategy found an external link
    NoLinks,

    // ===== Skip States =====
    /// The row had no channel URL
    Skipped,

    /// The run was cancelled before this row was dispatched
    Cancelled,

    // ===== Error States =====
    /// The channel URL is not an http(s) URL
    Invalid,

    /// The About page did not load in time
    Timeout,

    /// The remote kept signalling bot detection after the retry
    Blocked,

    /// The circuit breaker rejected the request
    CircuitOpen,

    /// Any other failure, including a panic inside the item pipeline
    Failed,
}

impl ItemStatus {
    /// All statuses in report order
    pub const ALL: [ItemStatus; 9] = [
        Self::Success,
        Self::NoLinks,
        Self::Skipped,
        Self::Cancelled,
        Self::Invalid,
        Self::Timeout,
        Self::Blocked,
        Self::CircuitOpen,
        Self::Failed,
    ];

    /// Maps a fetch failure to the row status it produces
    pub fn from_fetch_error(error: &FetchError) -> Self {
        match error {
            FetchError::InvalidIdentifier(_) => Self::Invalid,
            FetchError::Timeout { .. } => Self::Timeout,
            FetchError::Blocked { .. } => Self::Blocked,
            FetchError::CircuitOpen => Self::CircuitOpen,
            FetchError::Source { .. } => Self::Failed,
        }
    }

    /// Returns true if links were extracted
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns true if the row was never fetched
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped | Self::Cancelled)
    }

    /// Returns true if this represents an error state
    ///
    /// NoLinks is benign: the page loaded, it just had nothing to offer.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Invalid | Self::Timeout | Self::Blocked | Self::CircuitOpen | Self::Failed
        )
    }

    /// Stable snake_case form used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NoLinks => "no_links",
            Self::Skipped => "skipped",
            Self::Cancelled => "cancelled",
            Self::Invalid => "invalid",
            Self::Timeout => "timeout",
            Self::Blocked => "blocked",
            Self::CircuitOpen => "circuit_open",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
