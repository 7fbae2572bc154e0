//! Configuration management for postforge
//!
//! Settings are layered:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use postforge::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Overrides follow the pattern `POSTFORGE__<section>__<key>`:
//! - `POSTFORGE__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `POSTFORGE__BROKER__CHANNEL_SIZE=32`
//! - `POSTFORGE__SCRAPER__NAVIGATION_TIMEOUT_SECS=45`
//!
//! `OPENAI_API_KEY` and `OPENAI_BASE_URL` are read directly.
//!
//! # Configuration File
//!
//! Loaded from `config/postforge.toml` unless `POSTFORGE_CONFIG` points
//! elsewhere. Without a `[broker]` section every job runs directly.

mod models;
mod sources;
mod validation;

pub use models::{
    BrokerConfig, Config, ImageConfig, ModelConfig, QueuePolicyConfig, ScraperConfig,
    ServerConfig, TelemetryConfig,
};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or a value
    /// fails validation (zero attempts, bad base url, ...).
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path, ignoring `POSTFORGE_CONFIG`
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
