//! Configuration module for Channel-Links
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use channel_links::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("channel-links.toml")).unwrap();
//! println!("Processing {} channels at a time", config.batch.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BatchConfig, CacheConfig, CircuitBreakerConfig, Config, FetchConfig, OutputConfig,
    RateLimitConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
