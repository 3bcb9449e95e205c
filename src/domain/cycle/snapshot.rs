//! Durable snapshot envelope of a lifecycle machine.
//!
//! This is the JSON body exchanged with the actor runtime under
//! `/actors/{userId}`.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CycleId, ValidationError};

use super::{CycleContext, CycleMachine, LifecycleState};

/// Envelope schema version written by this crate.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Run status of the machine that produced a snapshot. `Done` marks the
/// final state of a cycle; a later create starts a fresh machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStatus {
    #[default]
    Active,
    Done,
}

impl SnapshotStatus {
    fn of(state: LifecycleState) -> Self {
        match state {
            LifecycleState::Completed => SnapshotStatus::Done,
            _ => SnapshotStatus::Active,
        }
    }
}

/// Serialized lifecycle machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSnapshot {
    #[serde(default = "legacy_version")]
    pub version: u32,
    pub value: LifecycleState,
    pub context: CycleContext,
    #[serde(default)]
    pub status: SnapshotStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn legacy_version() -> u32 {
    SNAPSHOT_VERSION
}

impl CycleSnapshot {
    /// Cycle id recorded in the snapshot context.
    pub fn cycle_id(&self) -> Option<CycleId> {
        self.context.id
    }
}

impl CycleMachine {
    /// Captures the machine as a snapshot.
    pub fn snapshot(&self) -> CycleSnapshot {
        CycleSnapshot {
            version: SNAPSHOT_VERSION,
            value: self.state(),
            context: self.context().clone(),
            status: SnapshotStatus::of(self.state()),
            output: None,
            error: None,
        }
    }

    /// Rebuilds a machine from a stored snapshot.
    ///
    /// # Errors
    ///
    /// `InvalidFormat` when the snapshot was written by a newer schema, or
    /// when a state that owns a cycle has no cycle id in its context.
    pub fn restore(snapshot: &CycleSnapshot) -> Result<Self, ValidationError> {
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(ValidationError::invalid_format(
                "snapshot.version",
                format!(
                    "unsupported version {} (max {})",
                    snapshot.version, SNAPSHOT_VERSION
                ),
            ));
        }
        let owns_cycle = matches!(
            snapshot.value,
            LifecycleState::InProgress
                | LifecycleState::Updating
                | LifecycleState::Completing
                | LifecycleState::Completed
        );
        if owns_cycle && snapshot.context.id.is_none() {
            return Err(ValidationError::empty_field("snapshot.context.id"));
        }
        Ok(CycleMachine::from_parts(
            snapshot.value,
            snapshot.context.clone(),
        ))
    }
}
