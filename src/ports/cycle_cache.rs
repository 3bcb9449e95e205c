//! Cycle cache port - per-user active-cycle entries.
//!
//! A cached `None` means "the repository said there is no active cycle";
//! a miss means "unknown" and must fall through to the repository.

use async_trait::async_trait;

use crate::domain::cycle::{CycleError, CycleRecord};
use crate::domain::foundation::UserId;

/// Errors that can occur in a cache backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to encode cache entry: {0}")]
    Serialization(String),
}

impl From<CacheError> for CycleError {
    fn from(err: CacheError) -> Self {
        CycleError::Cache(err.to_string())
    }
}

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Entry present and unexpired; the inner value may be "no active cycle".
    Hit(Option<CycleRecord>),
    Miss,
}

/// Port for the per-user active-cycle cache.
#[async_trait]
pub trait CycleCache: Send + Sync {
    async fn lookup(&self, user_id: &UserId) -> Result<CacheLookup, CacheError>;

    async fn store(&self, user_id: &UserId, entry: Option<CycleRecord>)
        -> Result<(), CacheError>;

    async fn evict(&self, user_id: &UserId) -> Result<(), CacheError>;

    /// Drop every entry.
    async fn clear(&self) -> Result<(), CacheError>;
}
