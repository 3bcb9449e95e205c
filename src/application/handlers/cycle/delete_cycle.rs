//! DeleteCycleHandler - Command handler for removing a completed cycle.
//!
//! Only completed cycles can be deleted. A running cycle is owned by the
//! lifecycle machine and must be completed first.

use std::sync::Arc;

use crate::domain::cycle::{CycleError, LifecycleState};
use crate::domain::foundation::{CycleId, CycleStatus, UserId};
use crate::ports::CycleRepository;

/// Command to delete one of the user's completed cycles.
#[derive(Debug, Clone)]
pub struct DeleteCycleCommand {
    pub user_id: UserId,
    pub cycle_id: CycleId,
}

pub struct DeleteCycleHandler {
    repository: Arc<dyn CycleRepository>,
}

impl DeleteCycleHandler {
    pub fn new(repository: Arc<dyn CycleRepository>) -> Self {
        Self { repository }
    }

    /// # Errors
    ///
    /// - `CycleNotFound` if the cycle is missing or owned by another user
    /// - `CycleInvalidState` if the cycle is still in progress
    /// - `Repository` on database failure
    pub async fn handle(&self, cmd: DeleteCycleCommand) -> Result<(), CycleError> {
        let record = self
            .repository
            .find_by_id(&cmd.cycle_id)
            .await?
            .filter(|r| r.user_id == cmd.user_id)
            .ok_or_else(|| CycleError::CycleNotFound(cmd.cycle_id.to_string()))?;

        if record.status != CycleStatus::Completed {
            return Err(CycleError::invalid_state(
                LifecycleState::InProgress,
                "DELETE_CYCLE",
            ));
        }

        self.repository.delete(&cmd.cycle_id).await?;
        tracing::info!(cycle_id = %cmd.cycle_id, user_id = %cmd.user_id, "Cycle deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryCycleRepository;
    use crate::domain::cycle::{CycleDates, CycleRecord};
    use crate::domain::foundation::Timestamp;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn record(owner: &str, completed: bool) -> CycleRecord {
        let start = Timestamp::parse_rfc3339("2024-01-01T00:00:00Z").unwrap();
        let dates = CycleDates::new(start, start.plus_hours(16)).unwrap();
        let mut record = CycleRecord::start(CycleId::new(), user(owner), dates);
        if completed {
            record.complete(dates).unwrap();
        }
        record
    }

    async fn setup(record: &CycleRecord) -> (DeleteCycleHandler, InMemoryCycleRepository) {
        let repository = InMemoryCycleRepository::new();
        repository.insert(record.clone()).await;
        (DeleteCycleHandler::new(Arc::new(repository.clone())), repository)
    }

    #[tokio::test]
    async fn deletes_completed_cycle() {
        let record = record("u1", true);
        let (handler, repository) = setup(&record).await;

        handler
            .handle(DeleteCycleCommand {
                user_id: user("u1"),
                cycle_id: record.id,
            })
            .await
            .unwrap();

        assert!(repository.is_empty().await);
    }

    #[tokio::test]
    async fn refuses_in_progress_cycle() {
        let record = record("u1", false);
        let (handler, repository) = setup(&record).await;

        let result = handler
            .handle(DeleteCycleCommand {
                user_id: user("u1"),
                cycle_id: record.id,
            })
            .await;

        assert!(matches!(result, Err(CycleError::CycleInvalidState { .. })));
        assert_eq!(repository.len().await, 1);
    }

    #[tokio::test]
    async fn foreign_cycle_reads_as_not_found() {
        let record = record("u1", true);
        let (handler, repository) = setup(&record).await;

        let result = handler
            .handle(DeleteCycleCommand {
                user_id: user("u2"),
                cycle_id: record.id,
            })
            .await;

        assert!(matches!(result, Err(CycleError::CycleNotFound(_))));
        assert_eq!(repository.len().await, 1);
    }

    #[tokio::test]
    async fn missing_cycle_is_not_found() {
        let handler = DeleteCycleHandler::new(Arc::new(InMemoryCycleRepository::new()));

        let result = handler
            .handle(DeleteCycleCommand {
                user_id: user("u1"),
                cycle_id: CycleId::new(),
            })
            .await;

        assert!(matches!(result, Err(CycleError::CycleNotFound(_))));
    }

    #[tokio::test]
    async fn repository_failure_is_surfaced() {
        let record = record("u1", true);
        let (handler, repository) = setup(&record).await;
        repository.fail_delete(true);

        let result = handler
            .handle(DeleteCycleCommand {
                user_id: user("u1"),
                cycle_id: record.id,
            })
            .await;

        assert!(matches!(result, Err(CycleError::Repository(_))));
    }
}
