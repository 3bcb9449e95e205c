//! Effect executor - runs the side effects requested by lifecycle
//! transitions against the index grain, the read model and the cache.
//!
//! Every effect resolves to the machine event reporting its outcome. The
//! create path compensates partial failures:
//!
//! | Failure | Compensation |
//! |---------|--------------|
//! | index refuses | none |
//! | repository insert | release index reservation |
//! | cache write | delete inserted row, release index reservation |
//! | snapshot persist | delete inserted row, release index reservation, evict cache |
//!
//! Compensation is best-effort; a failed compensation is logged for manual
//! remediation and never replaces the original error.

use std::sync::Arc;

use crate::application::cache::RefCache;
use crate::domain::cycle::{CycleDates, CycleError, CycleRecord, Effect, LifecycleEvent};
use crate::domain::foundation::{CycleId, UserId};
use crate::ports::{ActiveCycleIndex, ActorRuntimeError, CycleRepository};

pub struct CycleEffects {
    index: Arc<dyn ActiveCycleIndex>,
    repository: Arc<dyn CycleRepository>,
    cache: Arc<RefCache>,
}

impl CycleEffects {
    pub fn new(
        index: Arc<dyn ActiveCycleIndex>,
        repository: Arc<dyn CycleRepository>,
        cache: Arc<RefCache>,
    ) -> Self {
        Self {
            index,
            repository,
            cache,
        }
    }

    /// Runs `effect` and returns the event to feed back into the machine.
    pub async fn run(&self, effect: Effect) -> LifecycleEvent {
        match effect {
            Effect::CreateCycle { user_id, dates } => match self.create(&user_id, dates).await {
                Ok(record) => LifecycleEvent::CreateSucceeded { record },
                Err(error) => LifecycleEvent::CreateFailed { error },
            },
            Effect::UpdateDates {
                cycle_id,
                user_id,
                dates,
            } => match self.update(&cycle_id, &user_id, dates).await {
                Ok(record) => LifecycleEvent::UpdateSucceeded { record },
                Err(error) => LifecycleEvent::UpdateFailed { error },
            },
            Effect::CompleteCycle {
                cycle_id,
                user_id,
                dates,
            } => match self.complete(&cycle_id, &user_id, dates).await {
                Ok(record) => LifecycleEvent::CompleteSucceeded { record },
                Err(error) => LifecycleEvent::CompleteFailed { error },
            },
        }
    }

    async fn create(&self, user_id: &UserId, dates: CycleDates) -> Result<CycleRecord, CycleError> {
        let cycle_id = CycleId::new();

        if !self
            .index
            .try_start_new_cycle(user_id, &cycle_id, &dates)
            .await?
        {
            tracing::info!(user_id = %user_id, "Index refused new cycle, one is already active");
            return Err(CycleError::AlreadyInProgress {
                user_id: user_id.clone(),
            });
        }

        let record = CycleRecord::start(cycle_id, user_id.clone(), dates);
        let record = match self.repository.create(&record).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    cycle_id = %cycle_id,
                    error = %e,
                    "Cycle insert failed, releasing index reservation"
                );
                self.release_reservation(&cycle_id).await;
                return Err(e.into());
            }
        };

        if let Err(e) = self.cache.set(user_id, Some(record.clone())).await {
            tracing::warn!(
                user_id = %user_id,
                cycle_id = %cycle_id,
                error = %e,
                "Cache write failed after insert, rolling back cycle"
            );
            self.discard(&cycle_id, user_id).await;
            return Err(e.into());
        }

        tracing::debug!(user_id = %user_id, cycle_id = %cycle_id, "Cycle created");
        Ok(record)
    }

    async fn update(
        &self,
        cycle_id: &CycleId,
        user_id: &UserId,
        dates: CycleDates,
    ) -> Result<CycleRecord, CycleError> {
        let record = self.repository.update_dates(cycle_id, &dates).await?;

        if let Err(e) = self.cache.set(user_id, Some(record.clone())).await {
            tracing::warn!(user_id = %user_id, cycle_id = %cycle_id, error = %e, "Failed to refresh cache after date update");
        }
        Ok(record)
    }

    async fn complete(
        &self,
        cycle_id: &CycleId,
        user_id: &UserId,
        dates: CycleDates,
    ) -> Result<CycleRecord, CycleError> {
        let record = self.repository.complete(cycle_id, &dates).await?;
        match self.index.mark_complete(cycle_id).await {
            Ok(()) => {}
            // Released by an earlier attempt whose snapshot never landed.
            Err(ActorRuntimeError::NotFound(_)) => {
                tracing::debug!(user_id = %user_id, cycle_id = %cycle_id, "Index reservation already released");
            }
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = self.cache.remove(user_id).await {
            tracing::warn!(user_id = %user_id, cycle_id = %cycle_id, error = %e, "Failed to evict completed cycle from cache");
        }
        Ok(record)
    }

    /// Undoes a create whose snapshot never reached the store, so the user
    /// is free to start again.
    pub async fn compensate_create(&self, cycle_id: &CycleId, user_id: &UserId) {
        tracing::warn!(user_id = %user_id, cycle_id = %cycle_id, "Rolling back cycle without snapshot");
        self.discard(cycle_id, user_id).await;
        if let Err(e) = self.cache.remove(user_id).await {
            tracing::warn!(user_id = %user_id, cycle_id = %cycle_id, error = %e, "Failed to evict rolled back cycle from cache");
        }
    }

    async fn discard(&self, cycle_id: &CycleId, user_id: &UserId) {
        if let Err(e) = self.repository.delete(cycle_id).await {
            tracing::error!(
                user_id = %user_id,
                cycle_id = %cycle_id,
                error = %e,
                "Failed to delete orphaned cycle row, manual remediation required"
            );
        }
        self.release_reservation(cycle_id).await;
    }

    async fn release_reservation(&self, cycle_id: &CycleId) {
        match self.index.mark_complete(cycle_id).await {
            Ok(()) => {}
            Err(ActorRuntimeError::NotFound(_)) => {
                tracing::debug!(cycle_id = %cycle_id, "Index reservation already released");
            }
            Err(e) => {
                tracing::error!(
                    cycle_id = %cycle_id,
                    error = %e,
                    "Failed to release index reservation, manual remediation required"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::actor_runtime::InMemoryActorRuntime;
    use crate::adapters::cache::LruCycleCache;
    use crate::adapters::memory::InMemoryCycleRepository;
    use crate::domain::foundation::{CycleStatus, Timestamp};
    use crate::ports::{CacheError, CacheLookup, CycleCache};
    use async_trait::async_trait;
    use std::time::Duration;

    // ─────────────────────────────────────────────────────────────────────
    // Test Fixtures
    // ─────────────────────────────────────────────────────────────────────

    struct FailingWrites;

    #[async_trait]
    impl CycleCache for FailingWrites {
        async fn lookup(&self, _user_id: &UserId) -> Result<CacheLookup, CacheError> {
            Ok(CacheLookup::Miss)
        }

        async fn store(
            &self,
            _user_id: &UserId,
            _entry: Option<CycleRecord>,
        ) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("write refused".into()))
        }

        async fn evict(&self, _user_id: &UserId) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("write refused".into()))
        }

        async fn clear(&self) -> Result<(), CacheError> {
            Ok(())
        }
    }

    struct Fixture {
        effects: CycleEffects,
        runtime: InMemoryActorRuntime,
        repository: InMemoryCycleRepository,
    }

    fn fixture_with_cache(cache: Arc<dyn CycleCache>) -> Fixture {
        let runtime = InMemoryActorRuntime::new();
        let repository = InMemoryCycleRepository::new();
        let ref_cache = Arc::new(RefCache::new(cache, Arc::new(repository.clone())));
        let effects = CycleEffects::new(
            Arc::new(runtime.clone()),
            Arc::new(repository.clone()),
            ref_cache,
        );
        Fixture {
            effects,
            runtime,
            repository,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_cache(Arc::new(LruCycleCache::new(16, Duration::from_secs(60))))
    }

    fn user() -> UserId {
        UserId::new("u1").unwrap()
    }

    fn dates(hours: i64) -> CycleDates {
        let start = Timestamp::parse_rfc3339("2024-01-01T00:00:00Z").unwrap();
        CycleDates::new(start, start.plus_hours(hours)).unwrap()
    }

    async fn created(f: &Fixture) -> CycleRecord {
        match f
            .effects
            .run(Effect::CreateCycle {
                user_id: user(),
                dates: dates(24),
            })
            .await
        {
            LifecycleEvent::CreateSucceeded { record } => record,
            other => panic!("expected CreateSucceeded, got {:?}", other),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Create
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn create_reserves_index_and_inserts_row() {
        let f = fixture();

        let record = created(&f).await;

        assert_eq!(record.status, CycleStatus::InProgress);
        assert_eq!(f.runtime.active_for(&user()).await, Some(record.id));
        assert_eq!(f.repository.len().await, 1);
    }

    #[tokio::test]
    async fn create_refused_by_index_is_already_in_progress() {
        let f = fixture();
        f.runtime.seed_active(&user(), CycleId::new()).await;

        let event = f
            .effects
            .run(Effect::CreateCycle {
                user_id: user(),
                dates: dates(24),
            })
            .await;

        assert_eq!(
            event,
            LifecycleEvent::CreateFailed {
                error: CycleError::AlreadyInProgress { user_id: user() }
            }
        );
        assert!(f.repository.is_empty().await);
    }

    #[tokio::test]
    async fn failed_insert_releases_reservation() {
        let f = fixture();
        f.repository.fail_create(true);

        let event = f
            .effects
            .run(Effect::CreateCycle {
                user_id: user(),
                dates: dates(24),
            })
            .await;

        assert!(matches!(
            event,
            LifecycleEvent::CreateFailed {
                error: CycleError::Repository(_)
            }
        ));
        assert_eq!(f.runtime.active_for(&user()).await, None);
    }

    #[tokio::test]
    async fn failed_cache_write_rolls_back_row_and_reservation() {
        let f = fixture_with_cache(Arc::new(FailingWrites));

        let event = f
            .effects
            .run(Effect::CreateCycle {
                user_id: user(),
                dates: dates(24),
            })
            .await;

        assert!(matches!(
            event,
            LifecycleEvent::CreateFailed {
                error: CycleError::Cache(_)
            }
        ));
        assert!(f.repository.is_empty().await);
        assert_eq!(f.runtime.active_for(&user()).await, None);
    }

    #[tokio::test]
    async fn failed_rollback_still_surfaces_cache_error() {
        let f = fixture_with_cache(Arc::new(FailingWrites));
        f.repository.fail_delete(true);

        let event = f
            .effects
            .run(Effect::CreateCycle {
                user_id: user(),
                dates: dates(24),
            })
            .await;

        assert!(matches!(
            event,
            LifecycleEvent::CreateFailed {
                error: CycleError::Cache(_)
            }
        ));
        assert_eq!(f.repository.len().await, 1);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Update / Complete
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn update_rewrites_dates() {
        let f = fixture();
        let record = created(&f).await;

        let event = f
            .effects
            .run(Effect::UpdateDates {
                cycle_id: record.id,
                user_id: user(),
                dates: dates(36),
            })
            .await;

        match event {
            LifecycleEvent::UpdateSucceeded { record: updated } => {
                assert_eq!(updated.end_date, dates(36).end_date());
            }
            other => panic!("expected UpdateSucceeded, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn update_failure_is_reported() {
        let f = fixture();
        let record = created(&f).await;
        f.repository.fail_update(true);

        let event = f
            .effects
            .run(Effect::UpdateDates {
                cycle_id: record.id,
                user_id: user(),
                dates: dates(36),
            })
            .await;

        assert!(matches!(event, LifecycleEvent::UpdateFailed { .. }));
    }

    #[tokio::test]
    async fn complete_marks_row_and_releases_index() {
        let f = fixture();
        let record = created(&f).await;

        let event = f
            .effects
            .run(Effect::CompleteCycle {
                cycle_id: record.id,
                user_id: user(),
                dates: dates(20),
            })
            .await;

        match event {
            LifecycleEvent::CompleteSucceeded { record: done } => {
                assert_eq!(done.status, CycleStatus::Completed);
            }
            other => panic!("expected CompleteSucceeded, got {:?}", other),
        }
        assert_eq!(f.runtime.active_for(&user()).await, None);
    }

    #[tokio::test]
    async fn complete_tolerates_already_released_reservation() {
        let f = fixture();
        let record = created(&f).await;
        f.runtime.mark_complete(&record.id).await.unwrap();

        let event = f
            .effects
            .run(Effect::CompleteCycle {
                cycle_id: record.id,
                user_id: user(),
                dates: dates(20),
            })
            .await;

        assert!(matches!(event, LifecycleEvent::CompleteSucceeded { .. }));
        assert_eq!(f.runtime.mark_complete_calls(), 2);
    }

    #[tokio::test]
    async fn compensate_create_removes_row_reservation_and_cache_entry() {
        let f = fixture();
        let record = created(&f).await;

        f.effects.compensate_create(&record.id, &user()).await;

        assert!(f.repository.is_empty().await);
        assert_eq!(f.runtime.active_for(&user()).await, None);
        assert!(f
            .runtime
            .try_start_new_cycle(&user(), &CycleId::new(), &dates(24))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn index_failure_on_complete_is_remote_client_error() {
        let f = fixture();
        let record = created(&f).await;
        f.runtime.fail_mark_complete(true);

        let event = f
            .effects
            .run(Effect::CompleteCycle {
                cycle_id: record.id,
                user_id: user(),
                dates: dates(20),
            })
            .await;

        assert!(matches!(
            event,
            LifecycleEvent::CompleteFailed {
                error: CycleError::RemoteClient(_)
            }
        ));
    }
}
