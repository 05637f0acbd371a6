use crate::config::types::{
    BatchConfig, CacheConfig, CircuitBreakerConfig, Config, FetchConfig, OutputConfig,
    RateLimitConfig,
};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_rate_limit_config(&config.rate_limit)?;
    validate_circuit_breaker_config(&config.circuit_breaker)?;
    validate_batch_config(&config.batch)?;
    validate_cache_config(&config.cache)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "timeout_ms must be greater than 0".to_string(),
        ));
    }

    if config.readiness_timeout_ms == 0 || config.readiness_timeout_ms > config.timeout_ms {
        return Err(ConfigError::Validation(format!(
            "readiness_timeout_ms must be between 1 and timeout_ms ({}), got {}",
            config.timeout_ms, config.readiness_timeout_ms
        )));
    }

    if config.max_block_retries > 5 {
        return Err(ConfigError::Validation(format!(
            "max_block_retries must be <= 5, got {}",
            config.max_block_retries
        )));
    }

    if !config.about_suffix.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "about_suffix must start with '/', got '{}'",
            config.about_suffix
        )));
    }

    if config.session_pool_size < 1 || config.session_pool_size > 32 {
        return Err(ConfigError::Validation(format!(
            "session_pool_size must be between 1 and 32, got {}",
            config.session_pool_size
        )));
    }

    Ok(())
}

/// Validates rate limit configuration
fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min_delay_ms ({}) must not exceed max_delay_ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.block_pause_min_ms > config.block_pause_max_ms {
        return Err(ConfigError::Validation(format!(
            "block_pause_min_ms ({}) must not exceed block_pause_max_ms ({})",
            config.block_pause_min_ms, config.block_pause_max_ms
        )));
    }

    Ok(())
}

/// Validates circuit breaker configuration
fn validate_circuit_breaker_config(config: &CircuitBreakerConfig) -> Result<(), ConfigError> {
    if config.failure_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "failure_threshold must be >= 1, got {}",
            config.failure_threshold
        )));
    }

    Ok(())
}

/// Validates batch configuration
fn validate_batch_config(config: &BatchConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 32 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 32, got {}",
            config.concurrency
        )));
    }

    if config.dispatch_jitter_min_ms > config.dispatch_jitter_max_ms {
        return Err(ConfigError::Validation(format!(
            "dispatch_jitter_min_ms ({}) must not exceed dispatch_jitter_max_ms ({})",
            config.dispatch_jitter_min_ms, config.dispatch_jitter_max_ms
        )));
    }

    if config.max_rows == Some(0) {
        return Err(ConfigError::Validation(
            "max_rows must be >= 1 when set".to_string(),
        ));
    }

    if config.progress_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "progress_interval must be >= 1, got {}",
            config.progress_interval
        )));
    }

    Ok(())
}

/// Validates cache configuration
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.enabled && config.expiry_ms == 0 {
        return Err(ConfigError::Validation(
            "expiry_ms must be greater than 0 when the cache is enabled".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.input_path.is_empty() {
        return Err(ConfigError::Validation(
            "input_path cannot be empty".to_string(),
        ));
    }

    if config.output_path.is_empty() {
        return Err(ConfigError::Validation(
            "output_path cannot be empty".to_string(),
        ));
    }

    if config.input_path == config.output_path {
        return Err(ConfigError::Validation(format!(
            "output_path must differ from input_path ('{}')",
            config.input_path
        )));
    }

    if let Some(column) = &config.url_column {
        if column.trim().is_empty() {
            return Err(ConfigError::Validation(
                "url_column cannot be blank when set".to_string(),
            ));
        }
    }

    Ok(())
}
