//! Batch statistics for the terminal
//!
//! This module formats a finished batch summary for stdout.

use crate::crawler::BatchSummary;

/// Share of `part` in `whole` as a percentage
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole > 0 {
        (part as f64 / whole as f64) * 100.0
    } else {
        0.0
    }
}

/// Prints a batch summary to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The summary to display
pub fn print_summary(summary: &BatchSummary) {
    println!("=== Batch Statistics ===\n");

    println!("Overview:");
    println!("  Rows in batch: {}", summary.total);
    println!("  Processed: {}", summary.processed);
    println!("  Succeeded: {}", summary.succeeded);
    println!("  No links found: {}", summary.no_links);
    println!("  Skipped (no URL): {}", summary.skipped);
    println!("  Errors: {}", summary.error_count());
    println!(
        "  Duration: {:.1}s",
        summary.duration().num_milliseconds() as f64 / 1000.0
    );
    println!();

    if summary.cancelled {
        println!(
            "Run was cancelled: {} rows were not dispatched\n",
            summary.not_dispatched
        );
    }

    if !summary.errors.is_empty() {
        println!("Errors:");
        for line in summary.error_lines() {
            println!("  {}", line);
        }
        println!();
    }

    if let Some(headline) = summary.headline() {
        println!("{}\n", headline);
    }

    println!(
        "Success Rate: {:.1}% ({} / {} rows with links)",
        percentage(summary.succeeded, summary.processed),
        summary.succeeded,
        summary.processed
    );
}
