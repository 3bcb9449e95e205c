//! Fasting cycle domain.
//!
//! - `CycleRecord` - read-model row
//! - `CycleMachine` - lifecycle state machine with a pure transition function
//! - `CycleSnapshot` - durable envelope of a machine instance
//! - `CycleError` - failure taxonomy of lifecycle operations

mod dates;
mod errors;
mod lifecycle;
mod record;
mod snapshot;
mod statistics;

pub use dates::CycleDates;
pub use errors::CycleError;
pub use lifecycle::{
    CycleContext, CycleMachine, Effect, LifecycleEvent, LifecycleState, Signal, Transition,
};
pub use record::CycleRecord;
pub use snapshot::{CycleSnapshot, SnapshotStatus, SNAPSHOT_VERSION};
pub use statistics::CycleStatistics;
