//! Active-cycle cache configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Which cache adapter to run
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-process LRU, per instance
    #[default]
    Memory,
    /// Shared Redis; requires the `redis` section
    Redis,
}

/// Cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    /// Entry lifetime in seconds
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    /// Maximum users held by the memory backend
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ttl_secs == 0 {
            return Err(ValidationError::InvalidCacheTtl);
        }
        if self.backend == CacheBackend::Memory && self.capacity == 0 {
            return Err(ValidationError::InvalidCacheCapacity);
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            ttl_secs: default_ttl(),
            capacity: default_capacity(),
        }
    }
}

fn default_ttl() -> u64 {
    300
}

fn default_capacity() -> usize {
    10_000
}
