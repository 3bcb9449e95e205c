//! Active-cycle cache adapters.
//!
//! - `LruCycleCache` - bounded in-process cache with TTL
//! - `RedisCycleCache` - shared cache for multi-instance deployments

mod lru;
mod redis;

pub use self::lru::LruCycleCache;
pub use self::redis::RedisCycleCache;
