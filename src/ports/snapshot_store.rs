//! Snapshot store port - durable lifecycle snapshots in the actor runtime.
//!
//! One grain per user holds the serialized lifecycle machine. The runtime
//! is only reachable over HTTP, so every call can fail with a transport
//! error in addition to a missing grain.

use async_trait::async_trait;

use crate::domain::cycle::{CycleError, CycleSnapshot};
use crate::domain::foundation::UserId;

/// Errors returned by actor runtime ports.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActorRuntimeError {
    /// The runtime answered 404.
    #[error("Grain not found: {0}")]
    NotFound(String),

    /// Transport failure, timeout, or an unexpected status.
    #[error("Actor runtime request failed: {0}")]
    Client(String),

    /// The body could not be decoded.
    #[error("Failed to decode actor runtime response: {0}")]
    Decode(String),
}

impl From<ActorRuntimeError> for CycleError {
    fn from(err: ActorRuntimeError) -> Self {
        match err {
            ActorRuntimeError::NotFound(key) => CycleError::RemoteNotFound(key),
            other => CycleError::RemoteClient(other.to_string()),
        }
    }
}

/// Port for reading and writing lifecycle snapshots keyed by user.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Fetch the user's current snapshot.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the user has no snapshot yet
    /// - `Client` / `Decode` on any other failure
    async fn get(&self, user_id: &UserId) -> Result<CycleSnapshot, ActorRuntimeError>;

    /// Overwrite the user's snapshot (last write wins).
    ///
    /// # Errors
    ///
    /// `Client` unless the runtime acknowledged the write.
    async fn persist(
        &self,
        user_id: &UserId,
        snapshot: &CycleSnapshot,
    ) -> Result<(), ActorRuntimeError>;
}
