//! ValidateCycleOverlapHandler - checks a proposed interval against the
//! user's most recent completed cycle.
//!
//! A proposal conflicts when it intersects that cycle or starts before it
//! ended; cycles cannot be back-dated behind the history.

use serde::Serialize;
use std::sync::Arc;

use crate::domain::cycle::{CycleDates, CycleError};
use crate::domain::foundation::{CycleId, Timestamp, UserId};
use crate::ports::CycleRepository;

#[derive(Debug, Clone)]
pub struct ValidateCycleOverlapQuery {
    pub user_id: UserId,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
}

/// Outcome of an overlap check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapCheck {
    pub overlaps: bool,
    pub conflicting_cycle_id: Option<CycleId>,
}

pub struct ValidateCycleOverlapHandler {
    repository: Arc<dyn CycleRepository>,
}

impl ValidateCycleOverlapHandler {
    pub fn new(repository: Arc<dyn CycleRepository>) -> Self {
        Self { repository }
    }

    /// # Errors
    ///
    /// - `Validation` if the proposed end is not after its start
    /// - `Repository` on read failure
    pub async fn handle(&self, query: ValidateCycleOverlapQuery) -> Result<OverlapCheck, CycleError> {
        let proposed = CycleDates::new(query.start_date, query.end_date)?;

        let Some(last) = self.repository.find_last_completed(&query.user_id).await? else {
            return Ok(OverlapCheck {
                overlaps: false,
                conflicting_cycle_id: None,
            });
        };

        let last_dates = last.dates()?;
        let overlaps = proposed.overlaps(&last_dates)
            || proposed.start_date().is_before(&last_dates.end_date());

        Ok(OverlapCheck {
            overlaps,
            conflicting_cycle_id: overlaps.then_some(last.id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryCycleRepository;
    use crate::domain::cycle::CycleRecord;

    fn user() -> UserId {
        UserId::new("u1").unwrap()
    }

    fn at(hour: i64) -> Timestamp {
        Timestamp::parse_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .plus_hours(hour)
    }

    /// Repository holding one completed cycle from hour 10 to hour 26.
    async fn setup() -> (ValidateCycleOverlapHandler, CycleId) {
        let repository = InMemoryCycleRepository::new();
        let dates = CycleDates::new(at(10), at(26)).unwrap();
        let mut record = CycleRecord::start(CycleId::new(), user(), dates);
        record.complete(dates).unwrap();
        let id = record.id;
        repository.insert(record).await;
        (ValidateCycleOverlapHandler::new(Arc::new(repository)), id)
    }

    async fn check(handler: &ValidateCycleOverlapHandler, start: i64, end: i64) -> OverlapCheck {
        handler
            .handle(ValidateCycleOverlapQuery {
                user_id: user(),
                start_date: at(start),
                end_date: at(end),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn intersecting_interval_conflicts() {
        let (handler, id) = setup().await;
        let result = check(&handler, 20, 40).await;
        assert!(result.overlaps);
        assert_eq!(result.conflicting_cycle_id, Some(id));
    }

    #[tokio::test]
    async fn interval_before_history_conflicts() {
        let (handler, _) = setup().await;
        assert!(check(&handler, 0, 5).await.overlaps);
    }

    #[tokio::test]
    async fn interval_after_last_end_is_clear() {
        let (handler, _) = setup().await;
        let result = check(&handler, 26, 40).await;
        assert_eq!(
            result,
            OverlapCheck {
                overlaps: false,
                conflicting_cycle_id: None
            }
        );
    }

    #[tokio::test]
    async fn user_without_history_is_clear() {
        let handler = ValidateCycleOverlapHandler::new(Arc::new(InMemoryCycleRepository::new()));
        assert!(!check(&handler, 0, 5).await.overlaps);
    }

    #[tokio::test]
    async fn inverted_proposal_is_validation_error() {
        let (handler, _) = setup().await;
        let result = handler
            .handle(ValidateCycleOverlapQuery {
                user_id: user(),
                start_date: at(40),
                end_date: at(30),
            })
            .await;
        assert!(matches!(result, Err(CycleError::Validation(_))));
    }
}
