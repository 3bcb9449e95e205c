//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `CycleRepository` - relational read model
//! - `SnapshotStore` - lifecycle snapshots in the actor runtime
//! - `ActiveCycleIndex` - one-active-cycle admission grain
//! - `CycleCache` - per-user active-cycle cache

mod active_cycle_index;
mod cycle_cache;
mod cycle_repository;
mod snapshot_store;

pub use active_cycle_index::{ActiveCycleIndex, ActiveCycleRef};
pub use cycle_cache::{CacheError, CacheLookup, CycleCache};
pub use cycle_repository::CycleRepository;
pub use snapshot_store::{ActorRuntimeError, SnapshotStore};
