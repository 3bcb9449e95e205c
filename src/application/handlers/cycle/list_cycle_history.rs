//! ListCycleHistoryHandler - Query handler for a user's cycles, most recent
//! first.

use std::sync::Arc;

use crate::domain::cycle::{CycleError, CycleRecord};
use crate::domain::foundation::UserId;
use crate::ports::CycleRepository;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// Upper bound on a single page.
pub const MAX_HISTORY_LIMIT: u32 = 200;

#[derive(Debug, Clone)]
pub struct ListCycleHistoryQuery {
    pub user_id: UserId,
    pub limit: Option<u32>,
}

pub type ListCycleHistoryResult = Vec<CycleRecord>;

pub struct ListCycleHistoryHandler {
    repository: Arc<dyn CycleRepository>,
}

impl ListCycleHistoryHandler {
    pub fn new(repository: Arc<dyn CycleRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(
        &self,
        query: ListCycleHistoryQuery,
    ) -> Result<ListCycleHistoryResult, CycleError> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        Ok(self.repository.list_by_user(&query.user_id, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryCycleRepository;
    use crate::domain::cycle::CycleDates;
    use crate::domain::foundation::{CycleId, Timestamp};

    fn user() -> UserId {
        UserId::new("u1").unwrap()
    }

    async fn repository_with(count: i64) -> InMemoryCycleRepository {
        let repository = InMemoryCycleRepository::new();
        let base = Timestamp::parse_rfc3339("2024-01-01T00:00:00Z").unwrap();
        for day in 0..count {
            let start = base.plus_hours(day * 24);
            let dates = CycleDates::new(start, start.plus_hours(16)).unwrap();
            let mut record = CycleRecord::start(CycleId::new(), user(), dates);
            record.complete(dates).unwrap();
            repository.insert(record).await;
        }
        repository
    }

    #[tokio::test]
    async fn returns_most_recent_first() {
        let handler = ListCycleHistoryHandler::new(Arc::new(repository_with(3).await));

        let history = handler
            .handle(ListCycleHistoryQuery {
                user_id: user(),
                limit: None,
            })
            .await
            .unwrap();

        assert_eq!(history.len(), 3);
        assert!(history[0].start_date.is_after(&history[1].start_date));
        assert!(history[1].start_date.is_after(&history[2].start_date));
    }

    #[tokio::test]
    async fn honours_requested_limit() {
        let handler = ListCycleHistoryHandler::new(Arc::new(repository_with(5).await));

        let history = handler
            .handle(ListCycleHistoryQuery {
                user_id: user(),
                limit: Some(2),
            })
            .await
            .unwrap();

        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn zero_limit_still_returns_one() {
        let handler = ListCycleHistoryHandler::new(Arc::new(repository_with(2).await));

        let history = handler
            .handle(ListCycleHistoryQuery {
                user_id: user(),
                limit: Some(0),
            })
            .await
            .unwrap();

        assert_eq!(history.len(), 1);
    }
}
