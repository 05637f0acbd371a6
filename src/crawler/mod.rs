//! Crawler module for About page fetching and batch processing
//!
//! This module contains the core fetching logic, including:
//! - Browser-like HTTP sessions with identity rotation
//! - Fetching with block detection and a bounded retry
//! - Adaptive request spacing and the circuit breaker
//! - Overall batch coordination

mod breaker;
mod cache;
mod coordinator;
mod fetcher;
mod headers;
mod report;
mod scheduler;
mod session;
mod source;

pub use breaker::CircuitBreaker;
pub use cache::ResultCache;
pub use coordinator::BatchRunner;
pub use fetcher::{contains_block_signal, ChannelId, FetchClient};
pub use headers::{build_browser_headers, random_user_agent, USER_AGENTS};
pub use report::{BatchItem, BatchReport, BatchSummary, ItemReport};
pub use scheduler::RateController;
pub use session::{PooledSession, Session, SessionPool};
pub use source::{describe_status, DocumentSource, HttpSource, SourceError};

use crate::config::Config;
use tokio_util::sync::CancellationToken;

/// Runs a complete batch over HTTP
///
/// This is the main entry point for processing a batch. It will:
/// 1. Build the session pool, rate controller and fetch client
/// 2. Dispatch every row through cache, breaker and fetch
/// 3. Collect one report per row, ordered by row index
///
/// # Arguments
///
/// * `config` - The run configuration
/// * `items` - Input rows, blank identifiers included
/// * `cancel` - Token that stops further dispatching
pub async fn run_batch(
    config: &Config,
    items: Vec<BatchItem>,
    cancel: CancellationToken,
) -> BatchReport {
    BatchRunner::from_config(config).run(items, cancel).await
}
