//! Markdown summary generation
//!
//! This module generates a human-readable markdown report of a batch run,
//! including counts per row status and the error list.

use crate::crawler::{BatchReport, BatchSummary};
use crate::output::stats::percentage;
use crate::state::ItemStatus;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Error rows listed before the report is cut off
const MAX_LISTED_ERRORS: usize = 50;

/// Writes a markdown summary of a batch run
///
/// # Arguments
///
/// * `report` - The finished batch
/// * `config_hash` - Hash of the config the run used
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_summary(
    report: &BatchReport,
    config_hash: &str,
    output_path: &Path,
) -> std::io::Result<()> {
    let markdown = format_markdown_summary(report, config_hash);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a batch report as markdown
pub fn format_markdown_summary(report: &BatchReport, config_hash: &str) -> String {
    let summary = &report.summary;
    let mut md = String::new();

    md.push_str("# Channel-Links Batch Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at.to_rfc3339()));
    let seconds = summary.duration().num_seconds();
    md.push_str(&format!(
        "- **Duration**: {} seconds ({:.2} minutes)\n",
        seconds,
        seconds as f64 / 60.0
    ));
    md.push_str(&format!(
        "- **Status**: {}\n",
        if summary.cancelled { "cancelled" } else { "completed" }
    ));
    md.push_str(&format!("- **Config Hash**: {}\n", config_hash));
    if let Some(note) = &summary.limit_note {
        md.push_str(&format!("- **Note**: {}\n", note));
    }
    md.push('\n');

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Rows**: {}\n", summary.total));
    md.push_str(&format!("- **Processed**: {}\n", summary.processed));
    md.push_str(&format!("- **Succeeded**: {}\n", summary.succeeded));
    md.push_str(&format!("- **Total Errors**: {}\n", summary.error_count()));
    md.push_str(&format!(
        "- **Links Found**: {}\n",
        report
            .items
            .iter()
            .filter_map(|item| item.links.as_ref())
            .map(|links| links.total())
            .sum::<usize>()
    ));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        percentage(summary.succeeded, summary.processed)
    ));

    md.push_str("## Row Status Breakdown\n\n");
    md.push_str("| Status | Count |\n");
    md.push_str("|--------|-------|\n");
    for status in ItemStatus::ALL {
        let count = report.items.iter().filter(|item| item.status == status).count();
        if count > 0 {
            md.push_str(&format!("| {} | {} |\n", status, count));
        }
    }
    md.push('\n');

    push_errors(&mut md, summary);

    md
}

fn push_errors(md: &mut String, summary: &BatchSummary) {
    if summary.errors.is_empty() {
        return;
    }

    md.push_str("## Errors\n\n");
    let lines = summary.error_lines();
    for line in lines.iter().take(MAX_LISTED_ERRORS) {
        md.push_str(&format!("- {}\n", line));
    }
    if lines.len() > MAX_LISTED_ERRORS {
        md.push_str(&format!("\n... and {} more\n", lines.len() - MAX_LISTED_ERRORS));
    }
    md.push('\n');
}
