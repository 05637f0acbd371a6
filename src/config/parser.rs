//! TOML loading for channel-links config files

use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigResult;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Reads, parses and validates a config file
///
/// ```no_run
/// use std::path::Path;
/// use channel_links::config::load_config;
///
/// let config = load_config(Path::new("channel-links.toml")).unwrap();
/// println!("Workers: {}", config.batch.concurrency);
/// ```
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    parse_config(&std::fs::read_to_string(path)?)
}

/// Hex SHA-256 of the raw config file bytes
///
/// Ends up in the markdown summary, tying an output table to its settings.
pub fn compute_config_hash(path: &Path) -> ConfigResult<String> {
    Ok(digest(&std::fs::read_to_string(path)?))
}

/// Config plus the hash of the exact text it was parsed from
///
/// The file is read once, so the hash cannot describe a different revision
/// than the one loaded.
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let text = std::fs::read_to_string(path)?;
    let config = parse_config(&text)?;
    Ok((config, digest(&text)))
}

fn parse_config(text: &str) -> ConfigResult<Config> {
    let config: Config = toml::from_str(text)?;
    validate(&config)?;
    Ok(config)
}

fn digest(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const MINIMAL_CONFIG: &str = r#"
[output]
input-path = "channels.csv"
output-path = "channels_with_links.csv"
"#;

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let file = create_temp_config(MINIMAL_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.fetch.timeout_ms, 30_000);
        assert_eq!(config.fetch.about_suffix, "/about");
        assert_eq!(config.rate_limit.block_pause_min_ms, 120_000);
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert_eq!(config.circuit_breaker.cooldown_ms, 300_000);
        assert_eq!(config.batch.concurrency, 3);
        assert!(!config.cache.enabled);
        assert_eq!(config.output.url_column, None);
    }

    #[test]
    fn test_load_full_config() {
        let config_content = r#"
[fetch]
timeout-ms = 20000
readiness-timeout-ms = 10000
block-retry-delay-ms = 60000
max-block-retries = 1
about-suffix = "/about"
session-pool-size = 2

[rate-limit]
min-delay-ms = 5000
max-delay-ms = 40000
block-pause-min-ms = 60000
block-pause-max-ms = 90000

[circuit-breaker]
failure-threshold = 3
cooldown-ms = 120000

[batch]
concurrency = 2
batch-size = 10
batch-pause-ms = 45000
dispatch-jitter-min-ms = 100
dispatch-jitter-max-ms = 500
max-rows = 50

[cache]
enabled = true
expiry-ms = 600000

[output]
input-path = "in.csv"
output-path = "out.csv"
url-column = "Channel URL"
summary-path = "summary.md"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.fetch.session_pool_size, 2);
        assert_eq!(config.rate_limit.max_delay_ms, 40_000);
        assert_eq!(config.circuit_breaker.failure_threshold, 3);
        assert_eq!(config.batch.max_rows, Some(50));
        assert!(config.cache.enabled);
        assert_eq!(config.output.url_column.as_deref(), Some("Channel URL"));
        assert_eq!(config.output.summary_path.as_deref(), Some("summary.md"));
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let config_content = "this is not valid TOML {{{";
        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_missing_output_table() {
        let file = create_temp_config("[batch]\nconcurrency = 2\n");
        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[batch]
concurrency = 0

[output]
input-path = "channels.csv"
output-path = "out.csv"
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let config_content = "test content";
        let file = create_temp_config(config_content);

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        // Same content should produce same hash
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA-256 produces 64 hex characters
    }

    #[test]
    fn test_load_config_with_hash() {
        let file = create_temp_config(MINIMAL_CONFIG);
        let (config, hash) = load_config_with_hash(file.path()).unwrap();
        assert_eq!(config.output.input_path, "channels.csv");
        assert_eq!(hash, compute_config_hash(file.path()).unwrap());
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
