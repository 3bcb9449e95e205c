//! GetCycleInProgressHandler - Query handler for the user's running cycle.
//!
//! Served from the RefCache, which falls back to the read model on a miss
//! and backfills the answer.

use std::sync::Arc;

use crate::application::cache::RefCache;
use crate::domain::cycle::{CycleError, CycleRecord};
use crate::domain::foundation::UserId;

/// Query for the user's in-progress cycle.
#[derive(Debug, Clone)]
pub struct GetCycleInProgressQuery {
    pub user_id: UserId,
}

/// `None` when the user has no running cycle.
pub type GetCycleInProgressResult = Option<CycleRecord>;

pub struct GetCycleInProgressHandler {
    cache: Arc<RefCache>,
}

impl GetCycleInProgressHandler {
    pub fn new(cache: Arc<RefCache>) -> Self {
        Self { cache }
    }

    pub async fn handle(
        &self,
        query: GetCycleInProgressQuery,
    ) -> Result<GetCycleInProgressResult, CycleError> {
        self.cache.get(&query.user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::LruCycleCache;
    use crate::adapters::memory::InMemoryCycleRepository;
    use crate::domain::cycle::CycleDates;
    use crate::domain::foundation::{CycleId, Timestamp};
    use crate::ports::{CacheLookup, CycleCache};
    use std::time::Duration;

    fn user() -> UserId {
        UserId::new("u1").unwrap()
    }

    #[tokio::test]
    async fn returns_repository_row_and_backfills_cache() {
        let backend = Arc::new(LruCycleCache::new(8, Duration::from_secs(60)));
        let repository = InMemoryCycleRepository::new();
        let start = Timestamp::parse_rfc3339("2024-01-01T00:00:00Z").unwrap();
        let record = CycleRecord::start(
            CycleId::new(),
            user(),
            CycleDates::new(start, start.plus_hours(16)).unwrap(),
        );
        repository.insert(record.clone()).await;
        let handler = GetCycleInProgressHandler::new(Arc::new(RefCache::new(
            backend.clone(),
            Arc::new(repository),
        )));

        let result = handler
            .handle(GetCycleInProgressQuery { user_id: user() })
            .await
            .unwrap();

        assert_eq!(result, Some(record.clone()));
        assert_eq!(backend.lookup(&user()).await.unwrap(), CacheLookup::Hit(Some(record)));
    }

    #[tokio::test]
    async fn repository_failure_surfaces_as_repository_error() {
        let repository = Arc::new(FailingReads);
        let handler = GetCycleInProgressHandler::new(Arc::new(RefCache::new(
            Arc::new(LruCycleCache::new(8, Duration::from_secs(60))),
            repository,
        )));

        let result = handler.handle(GetCycleInProgressQuery { user_id: user() }).await;

        assert!(matches!(result, Err(CycleError::Repository(_))));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mock Implementation
    // ─────────────────────────────────────────────────────────────────────

    use crate::domain::foundation::DomainError;
    use crate::ports::CycleRepository;
    use async_trait::async_trait;

    struct FailingReads;

    #[async_trait]
    impl CycleRepository for FailingReads {
        async fn create(&self, record: &CycleRecord) -> Result<CycleRecord, DomainError> {
            Ok(record.clone())
        }
        async fn update_dates(
            &self,
            _id: &CycleId,
            _dates: &CycleDates,
        ) -> Result<CycleRecord, DomainError> {
            Err(DomainError::database("unused"))
        }
        async fn complete(
            &self,
            _id: &CycleId,
            _dates: &CycleDates,
        ) -> Result<CycleRecord, DomainError> {
            Err(DomainError::database("unused"))
        }
        async fn find_by_id(&self, _id: &CycleId) -> Result<Option<CycleRecord>, DomainError> {
            Err(DomainError::database("Simulated read failure"))
        }
        async fn find_in_progress(
            &self,
            _user_id: &UserId,
        ) -> Result<Option<CycleRecord>, DomainError> {
            Err(DomainError::database("Simulated read failure"))
        }
        async fn find_last_completed(
            &self,
            _user_id: &UserId,
        ) -> Result<Option<CycleRecord>, DomainError> {
            Err(DomainError::database("Simulated read failure"))
        }
        async fn list_by_user(
            &self,
            _user_id: &UserId,
            _limit: u32,
        ) -> Result<Vec<CycleRecord>, DomainError> {
            Err(DomainError::database("Simulated read failure"))
        }
        async fn list_completed(&self, _user_id: &UserId) -> Result<Vec<CycleRecord>, DomainError> {
            Err(DomainError::database("Simulated read failure"))
        }
        async fn delete(&self, _id: &CycleId) -> Result<(), DomainError> {
            Ok(())
        }
        async fn delete_all_for_user(&self, _user_id: &UserId) -> Result<u64, DomainError> {
            Ok(0)
        }
    }
}
