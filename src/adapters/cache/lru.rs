//! In-process LRU cache with per-entry TTL.
//!
//! Bounded by capacity; entries older than the TTL read as misses and are
//! dropped on access.

use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::domain::cycle::CycleRecord;
use crate::domain::foundation::UserId;
use crate::ports::{CacheError, CacheLookup, CycleCache};

#[derive(Debug, Clone)]
struct Entry {
    stored_at: Instant,
    value: Option<CycleRecord>,
}

/// Process-local active-cycle cache.
#[derive(Debug)]
pub struct LruCycleCache {
    entries: Mutex<LruCache<UserId, Entry>>,
    ttl: Duration,
}

impl LruCycleCache {
    /// Creates a cache holding at most `capacity` users. A zero capacity is
    /// raised to one.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Number of entries currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl CycleCache for LruCycleCache {
    async fn lookup(&self, user_id: &UserId) -> Result<CacheLookup, CacheError> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(user_id) {
            None => return Ok(CacheLookup::Miss),
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                return Ok(CacheLookup::Hit(entry.value.clone()))
            }
            Some(_) => true,
        };
        if expired {
            entries.pop(user_id);
        }
        Ok(CacheLookup::Miss)
    }

    async fn store(
        &self,
        user_id: &UserId,
        entry: Option<CycleRecord>,
    ) -> Result<(), CacheError> {
        self.entries.lock().await.put(
            user_id.clone(),
            Entry {
                stored_at: Instant::now(),
                value: entry,
            },
        );
        Ok(())
    }

    async fn evict(&self, user_id: &UserId) -> Result<(), CacheError> {
        self.entries.lock().await.pop(user_id);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.entries.lock().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cycle::CycleDates;
    use crate::domain::foundation::{CycleId, Timestamp};

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn record(user_id: &str) -> CycleRecord {
        let start = Timestamp::parse_rfc3339("2024-01-01T00:00:00Z").unwrap();
        CycleRecord::start(
            CycleId::new(),
            user(user_id),
            CycleDates::new(start, start.plus_hours(16)).unwrap(),
        )
    }

    #[tokio::test]
    async fn stores_present_and_absent_entries() {
        let cache = LruCycleCache::new(8, Duration::from_secs(60));
        let active = record("u1");

        cache.store(&user("u1"), Some(active.clone())).await.unwrap();
        cache.store(&user("u2"), None).await.unwrap();

        assert_eq!(cache.lookup(&user("u1")).await.unwrap(), CacheLookup::Hit(Some(active)));
        assert_eq!(cache.lookup(&user("u2")).await.unwrap(), CacheLookup::Hit(None));
        assert_eq!(cache.lookup(&user("u3")).await.unwrap(), CacheLookup::Miss);
    }

    #[tokio::test]
    async fn expired_entries_read_as_misses() {
        let cache = LruCycleCache::new(8, Duration::ZERO);
        cache.store(&user("u1"), Some(record("u1"))).await.unwrap();

        assert_eq!(cache.lookup(&user("u1")).await.unwrap(), CacheLookup::Miss);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn least_recently_used_entry_is_dropped_at_capacity() {
        let cache = LruCycleCache::new(2, Duration::from_secs(60));
        cache.store(&user("u1"), None).await.unwrap();
        cache.store(&user("u2"), None).await.unwrap();
        cache.lookup(&user("u1")).await.unwrap();
        cache.store(&user("u3"), None).await.unwrap();

        assert_eq!(cache.lookup(&user("u2")).await.unwrap(), CacheLookup::Miss);
        assert_eq!(cache.lookup(&user("u1")).await.unwrap(), CacheLookup::Hit(None));
    }

    #[tokio::test]
    async fn evict_and_clear_remove_entries() {
        let cache = LruCycleCache::new(8, Duration::from_secs(60));
        cache.store(&user("u1"), None).await.unwrap();
        cache.store(&user("u2"), None).await.unwrap();

        cache.evict(&user("u1")).await.unwrap();
        assert_eq!(cache.len().await, 1);

        cache.clear().await.unwrap();
        assert!(cache.is_empty().await);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let cache = LruCycleCache::new(0, Duration::from_secs(1));
        assert_eq!(cache.entries.try_lock().unwrap().cap().get(), 1);
    }
}
