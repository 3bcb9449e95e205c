//! GetCycleHandler - Query handler for a single cycle record.

use std::sync::Arc;

use crate::domain::cycle::{CycleError, CycleRecord};
use crate::domain::foundation::{CycleId, UserId};
use crate::ports::CycleRepository;

/// Query to retrieve one of the user's cycles.
#[derive(Debug, Clone)]
pub struct GetCycleQuery {
    pub user_id: UserId,
    pub cycle_id: CycleId,
}

pub type GetCycleResult = CycleRecord;

/// Handler for retrieving a cycle. Cycles of other users read as missing.
pub struct GetCycleHandler {
    repository: Arc<dyn CycleRepository>,
}

impl GetCycleHandler {
    pub fn new(repository: Arc<dyn CycleRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, query: GetCycleQuery) -> Result<GetCycleResult, CycleError> {
        self.repository
            .find_by_id(&query.cycle_id)
            .await?
            .filter(|r| r.user_id == query.user_id)
            .ok_or_else(|| CycleError::CycleNotFound(query.cycle_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryCycleRepository;
    use crate::domain::cycle::CycleDates;
    use crate::domain::foundation::Timestamp;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    async fn setup() -> (GetCycleHandler, CycleRecord) {
        let repository = InMemoryCycleRepository::new();
        let start = Timestamp::parse_rfc3339("2024-01-01T00:00:00Z").unwrap();
        let record = CycleRecord::start(
            CycleId::new(),
            user("u1"),
            CycleDates::new(start, start.plus_hours(16)).unwrap(),
        );
        repository.insert(record.clone()).await;
        (GetCycleHandler::new(Arc::new(repository)), record)
    }

    #[tokio::test]
    async fn returns_owned_cycle() {
        let (handler, record) = setup().await;

        let result = handler
            .handle(GetCycleQuery {
                user_id: user("u1"),
                cycle_id: record.id,
            })
            .await
            .unwrap();

        assert_eq!(result, record);
    }

    #[tokio::test]
    async fn other_users_cycle_is_not_found() {
        let (handler, record) = setup().await;

        let result = handler
            .handle(GetCycleQuery {
                user_id: user("u2"),
                cycle_id: record.id,
            })
            .await;

        assert!(matches!(result, Err(CycleError::CycleNotFound(_))));
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let (handler, _) = setup().await;

        let result = handler
            .handle(GetCycleQuery {
                user_id: user("u1"),
                cycle_id: CycleId::new(),
            })
            .await;

        assert!(matches!(result, Err(CycleError::CycleNotFound(_))));
    }
}
