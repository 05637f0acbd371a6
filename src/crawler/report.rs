use crate::state::ItemStatus;
use crate::url::CategorizedLinks;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One input row handed to the batch runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    /// Zero-based row index in the input table
    pub index: usize,

    /// Raw channel URL cell, possibly blank
    pub identifier: String,
}

impl BatchItem {
    pub fn new(index: usize, identifier: impl Into<String>) -> Self {
        Self {
            index,
            identifier: identifier.into(),
        }
    }
}

/// Outcome for one input row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemReport {
    pub index: usize,
    pub links: Option<CategorizedLinks>,
    pub status: ItemStatus,
    pub message: String,
}

impl ItemReport {
    pub fn new(index: usize, status: ItemStatus, message: impl Into<String>) -> Self {
        Self {
            index,
            links: None,
            status,
            message: message.into(),
        }
    }

    pub fn skipped(index: usize) -> Self {
        Self::new(index, ItemStatus::Skipped, "Skipped (No URL)")
    }

    pub fn cancelled(index: usize) -> Self {
        Self::new(index, ItemStatus::Cancelled, "Cancelled before dispatch")
    }
}

/// Aggregate counts for a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Rows in the batch, including undispatched ones
    pub total: usize,

    /// Rows that ran to an outcome (blank rows included)
    pub processed: usize,

    pub succeeded: usize,
    pub no_links: usize,
    pub skipped: usize,

    /// Row index and message for every failed row
    pub errors: Vec<(usize, String)>,

    /// Whether the run was stopped early
    pub cancelled: bool,

    /// Rows never dispatched because of cancellation
    pub not_dispatched: usize,

    /// "Processing limited to first N rows" when the input was truncated
    pub limit_note: Option<String>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchSummary {
    /// Tallies item reports into a summary
    pub fn from_reports(
        reports: &[ItemReport],
        cancelled: bool,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let count = |pred: fn(&ItemStatus) -> bool| reports.iter().filter(|r| pred(&r.status)).count();

        let not_dispatched = count(|s| *s == ItemStatus::Cancelled);
        let errors = reports
            .iter()
            .filter(|r| r.status.is_error())
            .map(|r| (r.index, r.message.clone()))
            .collect();

        Self {
            total: reports.len(),
            processed: reports.len() - not_dispatched,
            succeeded: count(ItemStatus::is_success),
            no_links: count(|s| *s == ItemStatus::NoLinks),
            skipped: count(|s| *s == ItemStatus::Skipped),
            errors,
            cancelled,
            not_dispatched,
            limit_note: None,
            started_at,
            finished_at,
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Error lines in "Row N: message" form, N one-based
    pub fn error_lines(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|(index, message)| format!("Row {}: {}", index + 1, message))
            .collect()
    }

    /// One-line outcome in the form shown to users
    pub fn headline(&self) -> Option<String> {
        let errors = (!self.errors.is_empty())
            .then(|| format!("Encountered {} errors during processing.", self.errors.len()));

        match (&self.limit_note, errors) {
            (Some(note), Some(errors)) => Some(format!("{}. {}", note, errors)),
            (Some(note), None) => Some(note.clone()),
            (None, errors) => errors,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Everything a batch run produced, items ordered by row index
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub items: Vec<ItemReport>,
    pub summary: BatchSummary,
}

impl BatchReport {
    /// Attaches the input-truncation note to the summary
    pub fn with_limit_note(mut self, note: Option<String>) -> Self {
        self.summary.limit_note = note;
        self
    }
}
