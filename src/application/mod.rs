//! Application layer - lifecycle orchestration, caching, and handlers.
//!
//! `lifecycle` drives the cycle state machine across the read model, the
//! cache and the actor runtime. `handlers` serve the read-side queries and
//! deletions. Following CQRS, writes to an active cycle only go through the
//! lifecycle service.

pub mod cache;
pub mod handlers;
pub mod lifecycle;

pub use cache::RefCache;
pub use lifecycle::{CycleActor, CycleEffects, CycleLifecycleService, Emitted};
