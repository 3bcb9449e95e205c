//! DeleteUserCyclesHandler - removes every cycle of a user on account
//! deletion.
//!
//! The user's index reservation is released and a stored machine is reset to
//! `Idle` before the rows go, so no grain keeps pointing at a deleted cycle.

use serde::Serialize;
use std::sync::Arc;

use crate::application::cache::RefCache;
use crate::domain::cycle::{CycleError, CycleMachine};
use crate::domain::foundation::UserId;
use crate::ports::{ActiveCycleIndex, ActorRuntimeError, CycleRepository, SnapshotStore};

#[derive(Debug, Clone)]
pub struct DeleteUserCyclesCommand {
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteUserCyclesResult {
    pub deleted: u64,
}

pub struct DeleteUserCyclesHandler {
    repository: Arc<dyn CycleRepository>,
    index: Arc<dyn ActiveCycleIndex>,
    snapshots: Arc<dyn SnapshotStore>,
    cache: Arc<RefCache>,
}

impl DeleteUserCyclesHandler {
    pub fn new(
        repository: Arc<dyn CycleRepository>,
        index: Arc<dyn ActiveCycleIndex>,
        snapshots: Arc<dyn SnapshotStore>,
        cache: Arc<RefCache>,
    ) -> Self {
        Self {
            repository,
            index,
            snapshots,
            cache,
        }
    }

    /// # Errors
    ///
    /// `RemoteClient` if a grain cannot be reached; nothing has been
    /// deleted yet in that case. `Repository` from the bulk delete.
    pub async fn handle(
        &self,
        cmd: DeleteUserCyclesCommand,
    ) -> Result<DeleteUserCyclesResult, CycleError> {
        self.release_reservation(&cmd.user_id).await?;
        self.reset_machine(&cmd.user_id).await?;

        let deleted = self.repository.delete_all_for_user(&cmd.user_id).await?;

        if let Err(e) = self.cache.remove(&cmd.user_id).await {
            tracing::warn!(user_id = %cmd.user_id, error = %e, "Failed to evict cache after account deletion");
        }

        tracing::info!(user_id = %cmd.user_id, deleted, "User cycles deleted");
        Ok(DeleteUserCyclesResult { deleted })
    }

    async fn release_reservation(&self, user_id: &UserId) -> Result<(), CycleError> {
        let active = match self.index.get_active(user_id).await {
            Ok(active) => active,
            Err(ActorRuntimeError::NotFound(_)) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        match self.index.mark_complete(&active.cycle_id).await {
            Ok(()) | Err(ActorRuntimeError::NotFound(_)) => {
                tracing::debug!(user_id = %user_id, cycle_id = %active.cycle_id, "Index reservation released");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn reset_machine(&self, user_id: &UserId) -> Result<(), CycleError> {
        match self.snapshots.get(user_id).await {
            Ok(_) => Ok(self
                .snapshots
                .persist(user_id, &CycleMachine::new().snapshot())
                .await?),
            Err(ActorRuntimeError::NotFound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
