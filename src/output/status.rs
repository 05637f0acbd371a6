//! Point-in-time snapshot of the shared pipeline state

use crate::state::{BreakerSnapshot, RateSnapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Rate controller, circuit breaker and cache state at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineStatus {
    pub rate: RateSnapshot,
    pub breaker: BreakerSnapshot,

    /// Cached entries, or `None` when the cache is disabled
    pub cache_entries: Option<usize>,

    pub taken_at: DateTime<Utc>,
}

impl PipelineStatus {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes the snapshot as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
