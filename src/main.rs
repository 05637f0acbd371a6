//! Channel-Links main entry point
//!
//! This is the command-line interface for the Channel-Links batch extractor.

use anyhow::Context;
use channel_links::config::{load_config_with_hash, Config};
use channel_links::crawler::BatchRunner;
use channel_links::output::{generate_markdown_summary, print_summary, InputTable};
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Channel-Links: external link extraction for channel About pages
///
/// Channel-Links reads a CSV table of channel URLs, fetches each channel's
/// About page politely, and writes the table back with the channel's social
/// and website links in separate columns.
#[derive(Parser, Debug)]
#[command(name = "channel-links")]
#[command(version = "1.0.0")]
#[command(about = "Extract external links from channel About pages", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and input and show what would be processed
    #[arg(long)]
    dry_run: bool,

    /// Column holding channel URLs (overrides the config and detection)
    #[arg(long, value_name = "NAME")]
    column: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(column) = cli.column {
        config.output.url_column = Some(column);
    }

    let table = InputTable::read(
        Path::new(&config.output.input_path),
        config.output.url_column.as_deref(),
        config.batch.max_rows,
    )
    .with_context(|| format!("Failed to read input table {}", config.output.input_path))?;

    if cli.dry_run {
        handle_dry_run(&config, &table);
    } else {
        handle_run(&config, &config_hash, &table).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("channel_links=info,warn"),
            1 => EnvFilter::new("channel_links=debug,info"),
            2 => EnvFilter::new("channel_links=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the settings and the rows to process
fn handle_dry_run(config: &Config, table: &InputTable) {
    println!("=== Channel-Links Dry Run ===\n");

    println!("Fetch Configuration:");
    println!("  Timeout: {}ms", config.fetch.timeout_ms);
    println!("  Readiness timeout: {}ms", config.fetch.readiness_timeout_ms);
    println!("  About page suffix: {}", config.fetch.about_suffix);
    println!("  Session pool size: {}", config.fetch.session_pool_size);

    println!("\nRate Limiting:");
    println!(
        "  Request spacing: {}ms - {}ms",
        config.rate_limit.min_delay_ms, config.rate_limit.max_delay_ms
    );
    println!(
        "  Block pause: {}ms - {}ms",
        config.rate_limit.block_pause_min_ms, config.rate_limit.block_pause_max_ms
    );
    println!(
        "  Circuit breaker: opens after {} failures, {}ms cooldown",
        config.circuit_breaker.failure_threshold, config.circuit_breaker.cooldown_ms
    );

    println!("\nBatch:");
    println!("  Workers: {}", config.batch.concurrency);
    println!(
        "  Extended pause: {}ms every {} channels",
        config.batch.batch_pause_ms, config.batch.batch_size
    );
    println!(
        "  Cache: {}",
        if config.cache.enabled { "enabled" } else { "disabled" }
    );

    println!("\nInput: {}", config.output.input_path);
    println!("  URL column: {}", table.url_column_name());
    println!("  Rows: {}", table.len());
    if let Some(note) = table.limit_note() {
        println!("  {}", note);
    }

    let items = table.batch_items();
    let blank = items.iter().filter(|item| item.identifier.is_empty()).count();
    for item in items.iter().filter(|item| !item.identifier.is_empty()) {
        println!("    * {}", item.identifier);
    }

    println!("\nOutput: {}", config.output.output_path);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would process {} channels ({} blank rows skipped)",
        items.len() - blank,
        blank
    );
}

/// Handles the main batch run
async fn handle_run(config: &Config, config_hash: &str, table: &InputTable) -> anyhow::Result<()> {
    let runner = BatchRunner::from_config(config);
    let cancel = CancellationToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight channels");
            ctrl_c.cancel();
        }
    });

    let report = runner
        .run(table.batch_items(), cancel)
        .await
        .with_limit_note(table.limit_note().map(str::to_string));

    let output_path = Path::new(&config.output.output_path);
    table
        .write_augmented(&report.items, output_path)
        .with_context(|| format!("Failed to write output table {}", output_path.display()))?;
    tracing::info!("Results written to {}", output_path.display());

    if let Some(summary_path) = &config.output.summary_path {
        generate_markdown_summary(&report, config_hash, Path::new(summary_path))
            .with_context(|| format!("Failed to write summary {}", summary_path))?;
        tracing::info!("Summary written to {}", summary_path);
    }

    if let Some(status_path) = &config.output.status_path {
        runner
            .status()
            .write_json(Path::new(status_path))
            .with_context(|| format!("Failed to write status snapshot {}", status_path))?;
    }

    print_summary(&report.summary);

    Ok(())
}
