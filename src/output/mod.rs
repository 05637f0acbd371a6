//! Output module for tables, batch summaries and status snapshots
//!
//! This module handles:
//! - Reading the channel table and writing it back with link columns
//! - Printing batch statistics and writing markdown summaries
//! - Serializing pipeline status snapshots

mod markdown;
pub mod stats;
mod status;
mod table;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::print_summary;
pub use status::PipelineStatus;
pub use table::{detect_url_column, InputTable, TableError, TableResult, STATUS_COLUMN};
