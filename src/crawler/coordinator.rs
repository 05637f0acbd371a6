//! Batch coordinator - bounded-concurrency orchestration over channel rows
//!
//! This module contains the dispatch loop that coordinates a batch run,
//! including:
//! - Skipping blank rows and rejecting malformed channel URLs
//! - Bounding the number of channels in flight
//! - Extended pauses and dispatch jitter between requests
//! - Routing each channel through cache, circuit breaker and fetch client
//! - Isolating per-item panics and honouring cancellation

use crate::config::{BatchConfig, Config};
use crate::crawler::breaker::CircuitBreaker;
use crate::crawler::cache::ResultCache;
use crate::crawler::fetcher::{ChannelId, FetchClient};
use crate::crawler::report::{BatchItem, BatchReport, BatchSummary, ItemReport};
use crate::crawler::scheduler::RateController;
use crate::crawler::session::SessionPool;
use crate::crawler::source::{DocumentSource, HttpSource};
use crate::output::PipelineStatus;
use crate::parser::Extraction;
use crate::state::ItemStatus;
use crate::url::CategorizedLinks;
use crate::FetchError;
use chrono::Utc;
use futures::FutureExt;
use rand::Rng;
use std::collections::{BTreeMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// The per-item pipeline shared by all workers
#[derive(Clone)]
struct ItemPipeline {
    fetch_client: Arc<FetchClient>,
    breaker: Arc<CircuitBreaker>,
    cache: Option<Arc<ResultCache>>,
}

impl ItemPipeline {
    /// Runs one channel through cache, breaker, fetch and classification
    async fn process(&self, item: BatchItem) -> ItemReport {
        let channel = match ChannelId::parse(&item.identifier) {
            Ok(channel) => channel,
            Err(e) => return failure_report(item.index, &e),
        };

        match self.extract(&channel).await {
            Ok(extraction) if extraction.is_empty() => {
                ItemReport::new(item.index, ItemStatus::NoLinks, extraction.message())
            }
            Ok(extraction) => ItemReport {
                index: item.index,
                links: Some(CategorizedLinks::from_links(&extraction.links)),
                status: ItemStatus::Success,
                message: extraction.message(),
            },
            Err(e) => failure_report(item.index, &e),
        }
    }

    async fn extract(&self, channel: &ChannelId) -> Result<Extraction, FetchError> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(channel.as_str()) {
                tracing::debug!("Cache hit for {}", channel);
                return Ok(hit);
            }
        }

        let client = Arc::clone(&self.fetch_client);
        let extraction = self
            .breaker
            .call(|| async move { client.fetch_links(channel).await })
            .await?;

        if let Some(cache) = &self.cache {
            cache.insert(channel.as_str(), extraction.clone());
        }

        Ok(extraction)
    }
}

fn failure_report(index: usize, error: &FetchError) -> ItemReport {
    ItemReport::new(index, ItemStatus::from_fetch_error(error), error.to_string())
}

/// Running counts for progress logging
#[derive(Debug, Default)]
struct Progress {
    completed: usize,
    succeeded: usize,
    errors: usize,
}

/// Runs batches of channels through the extraction pipeline
pub struct BatchRunner {
    pipeline: ItemPipeline,
    rate: Arc<RateController>,
    config: BatchConfig,
}

impl BatchRunner {
    /// Creates a runner around an existing fetch client
    ///
    /// The circuit breaker and (if enabled) the result cache are built from
    /// `config`; `rate` must be the same controller the fetch client reports to.
    pub fn new(config: &Config, fetch_client: Arc<FetchClient>, rate: Arc<RateController>) -> Self {
        let cache = config
            .cache
            .enabled
            .then(|| Arc::new(ResultCache::new(config.cache.expiry())));

        Self {
            pipeline: ItemPipeline {
                fetch_client,
                breaker: Arc::new(CircuitBreaker::new(&config.circuit_breaker)),
                cache,
            },
            rate,
            config: config.batch.clone(),
        }
    }

    /// Creates a runner that fetches over HTTP
    pub fn from_config(config: &Config) -> Self {
        let rate = Arc::new(RateController::new(&config.rate_limit));
        let pool = SessionPool::new(config.fetch.session_pool_size);
        let source: Arc<dyn DocumentSource> = Arc::new(HttpSource::new(
            pool,
            config.fetch.timeout(),
            config.fetch.readiness_timeout(),
        ));
        let fetch_client = Arc::new(FetchClient::new(&config.fetch, source, Arc::clone(&rate)));

        Self::new(config, fetch_client, rate)
    }

    /// Snapshot of the shared rate, breaker and cache state
    pub fn status(&self) -> PipelineStatus {
        PipelineStatus {
            rate: self.rate.snapshot(),
            breaker: self.pipeline.breaker.snapshot(),
            cache_entries: self.pipeline.cache.as_ref().map(|cache| cache.len()),
            taken_at: Utc::now(),
        }
    }

    /// Runs a batch to completion or cancellation
    ///
    /// Every item gets exactly one report. Items are dispatched in order, at
    /// most `concurrency` at a time; once `cancel` fires no further items are
    /// dispatched, in-flight items finish, and the rest are reported as
    /// cancelled.
    ///
    /// # Arguments
    ///
    /// * `items` - Input rows, blank identifiers included
    /// * `cancel` - Token that stops further dispatching
    pub async fn run(&self, items: Vec<BatchItem>, cancel: CancellationToken) -> BatchReport {
        let started_at = Utc::now();
        let total = items.len();
        tracing::info!(
            "Starting batch of {} channels with {} workers",
            total,
            self.config.concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut join_set: JoinSet<(usize, ItemReport)> = JoinSet::new();
        let mut reports: BTreeMap<usize, ItemReport> = BTreeMap::new();
        let mut in_flight: HashSet<usize> = HashSet::new();
        let mut progress = Progress::default();
        let mut dispatched = 0usize;

        for item in items {
            if cancel.is_cancelled() {
                reports.insert(item.index, ItemReport::cancelled(item.index));
                continue;
            }

            if item.identifier.trim().is_empty() {
                tracing::info!("Row {}: Skipped (No URL)", item.index + 1);
                self.record(ItemReport::skipped(item.index), total, &mut progress, &mut reports);
                continue;
            }

            if !self.pace(dispatched, &cancel).await {
                reports.insert(item.index, ItemReport::cancelled(item.index));
                continue;
            }

            let permit = tokio::select! {
                permit = Arc::clone(&semaphore).acquire_owned() => permit,
                _ = cancel.cancelled() => {
                    reports.insert(item.index, ItemReport::cancelled(item.index));
                    continue;
                }
            };
            let Ok(permit) = permit else {
                reports.insert(item.index, ItemReport::cancelled(item.index));
                continue;
            };

            let pipeline = self.pipeline.clone();
            let index = item.index;
            in_flight.insert(index);
            join_set.spawn(async move {
                let _permit = permit;
                let report = match AssertUnwindSafe(pipeline.process(item)).catch_unwind().await {
                    Ok(report) => report,
                    Err(panic) => ItemReport::new(
                        index,
                        ItemStatus::Failed,
                        format!("Unexpected error: {}", panic_message(panic.as_ref())),
                    ),
                };
                (index, report)
            });
            dispatched += 1;

            while let Some(joined) = join_set.try_join_next() {
                self.collect(joined, total, &mut progress, &mut reports, &mut in_flight);
            }
        }

        while let Some(joined) = join_set.join_next().await {
            self.collect(joined, total, &mut progress, &mut reports, &mut in_flight);
        }

        // Tasks lost to an abort still need a row outcome
        for index in in_flight {
            reports.insert(
                index,
                ItemReport::new(index, ItemStatus::Failed, "Unexpected error: worker task lost"),
            );
        }

        let items: Vec<ItemReport> = reports.into_values().collect();
        let summary = BatchSummary::from_reports(&items, cancel.is_cancelled(), started_at, Utc::now());

        tracing::info!(
            "Batch finished: {} processed, {} succeeded, {} errors, {} skipped",
            summary.processed,
            summary.succeeded,
            summary.error_count(),
            summary.skipped
        );

        BatchReport { items, summary }
    }

    /// Waits out the extended pause and dispatch jitter before a dispatch
    ///
    /// Returns false if cancelled while waiting.
    async fn pace(&self, dispatched: usize, cancel: &CancellationToken) -> bool {
        let mut wait = Duration::ZERO;

        let batch_size = self.config.batch_size;
        if batch_size > 0 && dispatched > 0 && dispatched % batch_size == 0 {
            wait += Duration::from_millis(self.config.batch_pause_ms);
            tracing::info!(
                "Taking a longer break after {} channels ({:.1}s)",
                dispatched,
                wait.as_secs_f64()
            );
        }

        let (jitter_min, jitter_max) = (
            self.config.dispatch_jitter_min_ms,
            self.config.dispatch_jitter_max_ms,
        );
        if jitter_max > 0 {
            wait += Duration::from_millis(rand::thread_rng().gen_range(jitter_min..=jitter_max));
        }

        if wait.is_zero() {
            return !cancel.is_cancelled();
        }

        tokio::select! {
            _ = tokio::time::sleep(wait) => true,
            _ = cancel.cancelled() => false,
        }
    }

    fn collect(
        &self,
        joined: Result<(usize, ItemReport), JoinError>,
        total: usize,
        progress: &mut Progress,
        reports: &mut BTreeMap<usize, ItemReport>,
        in_flight: &mut HashSet<usize>,
    ) {
        match joined {
            Ok((index, report)) => {
                in_flight.remove(&index);
                self.record(report, total, progress, reports);
            }
            Err(e) => tracing::error!("Worker task failed: {}", e),
        }
    }

    fn record(
        &self,
        report: ItemReport,
        total: usize,
        progress: &mut Progress,
        reports: &mut BTreeMap<usize, ItemReport>,
    ) {
        progress.completed += 1;
        if report.status.is_success() {
            progress.succeeded += 1;
            tracing::info!("Row {}: {}", report.index + 1, report.message);
        } else if report.status.is_error() {
            progress.errors += 1;
            tracing::error!("Row {}: {}", report.index + 1, report.message);
        } else {
            tracing::info!("Row {}: {}", report.index + 1, report.message);
        }

        if progress.completed % self.config.progress_interval.max(1) == 0 {
            let rate = self.rate.snapshot();
            tracing::info!(
                "Progress: {}/{} processed, {} succeeded, {} errors (spacing {}ms, blocked for {}ms)",
                progress.completed,
                total,
                progress.succeeded,
                progress.errors,
                rate.current_delay_ms,
                rate.blocked_for_ms
            );
        }

        reports.insert(report.index, report);
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}
