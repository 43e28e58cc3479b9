//! Service configuration.
//!
//! Configuration comes from environment variables (with sensible local
//! defaults) or is assembled programmatically through builder-style
//! setters.

use std::path::PathBuf;

use thiserror::Error;

use crate::dispatch::DISPATCH_TOPIC;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration for the problem service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// PostgreSQL connection URL for the record store.
    pub database_url: String,
    /// Redis connection URL for the broker.
    pub redis_url: String,
    /// Base directory for ingested data files.
    pub data_dir: PathBuf,
    /// Topic name dispatch messages are published to.
    pub dispatch_topic: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/judgeforge".to_string(),
            redis_url: "redis://localhost:6379".to_string(),
            data_dir: PathBuf::from("./data"),
            dispatch_topic: DISPATCH_TOPIC.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from environment variables.
    ///
    /// `DATABASE_URL` is required; `REDIS_URL`, `JUDGEFORGE_DATA_DIR`,
    /// and `JUDGEFORGE_DISPATCH_TOPIC` fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let redis_url = std::env::var("REDIS_URL").unwrap_or(defaults.redis_url);
        let data_dir = std::env::var("JUDGEFORGE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let dispatch_topic =
            std::env::var("JUDGEFORGE_DISPATCH_TOPIC").unwrap_or(defaults.dispatch_topic);

        let config = Self {
            database_url,
            redis_url,
            data_dir,
            dispatch_topic,
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the database URL.
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    /// Sets the Redis URL.
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = url.into();
        self
    }

    /// Sets the data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Sets the dispatch topic.
    pub fn with_dispatch_topic(mut self, topic: impl Into<String>) -> Self {
        self.dispatch_topic = topic.into();
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "database_url must not be empty".to_string(),
            ));
        }
        if self.dispatch_topic.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "dispatch_topic must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
