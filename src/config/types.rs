use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Channel-Links
///
/// Every table except `[output]` may be omitted; missing tables and fields
/// fall back to the defaults below.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(rename = "rate-limit", default)]
    pub rate_limit: RateLimitConfig,
    #[serde(rename = "circuit-breaker", default)]
    pub circuit_breaker: CircuitBreakerConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub output: OutputConfig,
}

/// Fetch client behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Overall timeout for one About-page request (milliseconds)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Timeout for reading the response body once headers arrived (milliseconds)
    #[serde(rename = "readiness-timeout-ms")]
    pub readiness_timeout_ms: u64,

    /// Pause before the single retry of a blocked request (milliseconds)
    #[serde(rename = "block-retry-delay-ms")]
    pub block_retry_delay_ms: u64,

    /// Retries after a block signal before giving up
    #[serde(rename = "max-block-retries")]
    pub max_block_retries: u32,

    /// Path appended to the channel URL to reach its About page
    #[serde(rename = "about-suffix")]
    pub about_suffix: String,

    /// Number of HTTP sessions (each with its own identity) kept in the pool
    #[serde(rename = "session-pool-size")]
    pub session_pool_size: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            readiness_timeout_ms: 15_000,
            block_retry_delay_ms: 120_000,
            max_block_retries: 1,
            about_suffix: "/about".to_string(),
            session_pool_size: 3,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }

    pub fn block_retry_delay(&self) -> Duration {
        Duration::from_millis(self.block_retry_delay_ms)
    }
}

/// Adaptive request spacing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Floor for the spacing between consecutive requests (milliseconds)
    #[serde(rename = "min-delay-ms")]
    pub min_delay_ms: u64,

    /// Ceiling the spacing may grow to under repeated blocks (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,

    /// Lower bound of the full pause after a block signal (milliseconds)
    #[serde(rename = "block-pause-min-ms")]
    pub block_pause_min_ms: u64,

    /// Upper bound of the full pause after a block signal (milliseconds)
    #[serde(rename = "block-pause-max-ms")]
    pub block_pause_max_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 12_000,
            max_delay_ms: 60_000,
            block_pause_min_ms: 120_000,
            block_pause_max_ms: 300_000,
        }
    }
}

/// Failure-count circuit breaker around the fetch client
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    #[serde(rename = "failure-threshold")]
    pub failure_threshold: u32,

    /// Time the circuit stays open before a trial call (milliseconds)
    #[serde(rename = "cooldown-ms")]
    pub cooldown_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown_ms: 300_000,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Batch orchestration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum number of channels processed at once
    pub concurrency: usize,

    /// Dispatches between extended pauses (0 disables the pause)
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// Extended pause after every `batch-size` dispatches (milliseconds)
    #[serde(rename = "batch-pause-ms")]
    pub batch_pause_ms: u64,

    /// Lower bound of the random delay before each dispatch (milliseconds)
    #[serde(rename = "dispatch-jitter-min-ms")]
    pub dispatch_jitter_min_ms: u64,

    /// Upper bound of the random delay before each dispatch (milliseconds)
    #[serde(rename = "dispatch-jitter-max-ms")]
    pub dispatch_jitter_max_ms: u64,

    /// Only the first N input rows are processed when set
    #[serde(rename = "max-rows")]
    pub max_rows: Option<usize>,

    /// Completed items between progress log lines
    #[serde(rename = "progress-interval")]
    pub progress_interval: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            batch_size: 5,
            batch_pause_ms: 30_000,
            dispatch_jitter_min_ms: 0,
            dispatch_jitter_max_ms: 0,
            max_rows: None,
            progress_interval: 5,
        }
    }
}

/// Optional in-memory result cache
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,

    /// How long a stored result stays valid (milliseconds)
    #[serde(rename = "expiry-ms")]
    pub expiry_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            expiry_ms: 3_600_000,
        }
    }
}

impl CacheConfig {
    pub fn expiry(&self) -> Duration {
        Duration::from_millis(self.expiry_ms)
    }
}

/// Input and output locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// CSV file listing the channels
    #[serde(rename = "input-path")]
    pub input_path: String,

    /// Where the augmented CSV is written
    #[serde(rename = "output-path")]
    pub output_path: String,

    /// Column holding channel URLs; detected from the header when absent
    #[serde(rename = "url-column", default)]
    pub url_column: Option<String>,

    /// Optional markdown run summary
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,

    /// Optional JSON snapshot of the pipeline state at the end of the run
    #[serde(rename = "status-path", default)]
    pub status_path: Option<String>,
}
