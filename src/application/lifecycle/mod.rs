//! Cycle lifecycle runtime and orchestration.
//!
//! - `CycleActor` - spawned task driving one `CycleMachine`
//! - `CycleEffects` - executes machine effects against the stores
//! - `CycleLifecycleService` - create / update / complete / state

mod actor;
mod completion;
mod effects;
mod service;

pub use actor::{CycleActor, Emitted};
pub use effects::CycleEffects;
pub use service::CycleLifecycleService;
