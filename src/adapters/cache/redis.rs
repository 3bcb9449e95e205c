//! Redis-backed active-cycle cache for multi-instance deployments.
//!
//! Each user maps to `cycle:active:{userId}` holding the JSON encoding of
//! `Option<CycleRecord>` (`null` for "no active cycle"), written with
//! `SET .. EX` so Redis expires it.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

use crate::domain::cycle::CycleRecord;
use crate::domain::foundation::UserId;
use crate::ports::{CacheError, CacheLookup, CycleCache};

const KEY_PREFIX: &str = "cycle:active:";

/// Redis active-cycle cache.
#[derive(Clone)]
pub struct RedisCycleCache {
    conn: MultiplexedConnection,
    ttl_secs: u64,
}

impl RedisCycleCache {
    /// Creates a cache over an established connection. TTLs under one second
    /// are rounded up, since Redis rejects `EX 0`.
    pub fn new(conn: MultiplexedConnection, ttl: Duration) -> Self {
        Self {
            conn,
            ttl_secs: ttl.as_secs().max(1),
        }
    }
}

fn cache_key(user_id: &UserId) -> String {
    format!("{}{}", KEY_PREFIX, user_id)
}

fn encode(entry: &Option<CycleRecord>) -> Result<String, CacheError> {
    serde_json::to_string(entry).map_err(|e| CacheError::Serialization(e.to_string()))
}

fn decode(raw: &str) -> Result<Option<CycleRecord>, CacheError> {
    serde_json::from_str(raw).map_err(|e| CacheError::Serialization(e.to_string()))
}

fn unavailable(e: redis::RedisError) -> CacheError {
    CacheError::Unavailable(e.to_string())
}

#[async_trait]
impl CycleCache for RedisCycleCache {
    async fn lookup(&self, user_id: &UserId) -> Result<CacheLookup, CacheError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(cache_key(user_id)).await.map_err(unavailable)?;

        match raw {
            None => Ok(CacheLookup::Miss),
            Some(raw) => match decode(&raw) {
                Ok(entry) => Ok(CacheLookup::Hit(entry)),
                Err(e) => {
                    // Unreadable entries are treated as absent.
                    tracing::warn!(user_id = %user_id, error = %e, "Discarding undecodable cache entry");
                    Ok(CacheLookup::Miss)
                }
            },
        }
    }

    async fn store(
        &self,
        user_id: &UserId,
        entry: Option<CycleRecord>,
    ) -> Result<(), CacheError> {
        let payload = encode(&entry)?;
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(cache_key(user_id))
            .arg(payload)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(unavailable)
    }

    async fn evict(&self, user_id: &UserId) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(cache_key(user_id))
            .await
            .map_err(unavailable)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn
            .keys(format!("{}*", KEY_PREFIX))
            .await
            .map_err(unavailable)?;
        if keys.is_empty() {
            return Ok(());
        }
        conn.del::<_, ()>(keys).await.map_err(unavailable)
    }
}
