//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Invalid actor runtime URL format")]
    InvalidActorRuntimeUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid timeout for {0}: must be between 1 and 300 seconds")]
    InvalidTimeout(&'static str),

    #[error("Cache TTL must be greater than zero")]
    InvalidCacheTtl,

    #[error("Cache capacity must be greater than zero")]
    InvalidCacheCapacity,

    #[error("Invalid log filter directive: {0}")]
    InvalidLogFilter(String),
}
