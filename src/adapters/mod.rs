//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - `cycles` read model
//! - `actor_runtime` - HTTP client for snapshot and index grains
//! - `cache` - in-process LRU and Redis active-cycle caches
//! - `memory` - in-memory read model for tests and local runs

pub mod actor_runtime;
pub mod cache;
pub mod memory;
pub mod postgres;

pub use actor_runtime::{ActorRuntimeClient, InMemoryActorRuntime};
pub use cache::{LruCycleCache, RedisCycleCache};
pub use memory::InMemoryCycleRepository;
pub use postgres::PostgresCycleRepository;
