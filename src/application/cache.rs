//! RefCache - active-cycle lookups with repository fallback.
//!
//! Wraps a `CycleCache` backend. A miss (or an unreachable backend) falls
//! through to the repository, and the answer is written back, including
//! "no active cycle", so repeated reads stay off the database until the
//! entry expires.

use std::sync::Arc;

use crate::domain::cycle::{CycleError, CycleRecord};
use crate::domain::foundation::UserId;
use crate::ports::{CacheError, CacheLookup, CycleCache, CycleRepository};

/// Per-user active-cycle cache service.
pub struct RefCache {
    cache: Arc<dyn CycleCache>,
    repository: Arc<dyn CycleRepository>,
}

impl RefCache {
    pub fn new(cache: Arc<dyn CycleCache>, repository: Arc<dyn CycleRepository>) -> Self {
        Self { cache, repository }
    }

    /// Returns the user's in-progress cycle, if any.
    ///
    /// # Errors
    ///
    /// `Repository` when the cache misses and the repository read fails.
    pub async fn get(&self, user_id: &UserId) -> Result<Option<CycleRecord>, CycleError> {
        match self.cache.lookup(user_id).await {
            Ok(CacheLookup::Hit(entry)) => return Ok(entry),
            Ok(CacheLookup::Miss) => {}
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Cache lookup failed, reading repository");
            }
        }

        let record = self.repository.find_in_progress(user_id).await?;
        if let Err(e) = self.cache.store(user_id, record.clone()).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to backfill cache");
        }
        Ok(record)
    }

    /// Writes through to the cache backend. Callers decide whether a
    /// failure needs compensation.
    pub async fn set(
        &self,
        user_id: &UserId,
        record: Option<CycleRecord>,
    ) -> Result<(), CacheError> {
        self.cache.store(user_id, record).await
    }

    /// Drops the user's entry so the next read consults the repository.
    pub async fn remove(&self, user_id: &UserId) -> Result<(), CacheError> {
        self.cache.evict(user_id).await
    }

    /// Drops every entry.
    pub async fn invalidate_all(&self) -> Result<(), CacheError> {
        self.cache.clear().await
    }
}
