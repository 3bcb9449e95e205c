//! In-memory cycle repository.
//!
//! Mirrors the PostgreSQL adapter's semantics, including the one in-progress
//! row per user rule. Failure switches let tests exercise the saga's
//! compensation paths.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::cycle::{CycleDates, CycleRecord};
use crate::domain::foundation::{CycleId, CycleStatus, DomainError, ErrorCode, UserId};
use crate::ports::CycleRepository;

#[derive(Debug, Default)]
struct Faults {
    create: AtomicBool,
    update: AtomicBool,
    complete: AtomicBool,
    delete: AtomicBool,
}

/// In-memory storage for cycle records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCycleRepository {
    records: Arc<RwLock<HashMap<CycleId, CycleRecord>>>,
    faults: Arc<Faults>,
    complete_calls: Arc<AtomicUsize>,
}

impl InMemoryCycleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing the single-active rule.
    pub async fn insert(&self, record: CycleRecord) {
        self.records.write().await.insert(record.id, record);
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// How many times `complete` reached the store.
    pub fn complete_calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }

    pub fn fail_create(&self, fail: bool) {
        self.faults.create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_update(&self, fail: bool) {
        self.faults.update.store(fail, Ordering::SeqCst);
    }

    pub fn fail_complete(&self, fail: bool) {
        self.faults.complete.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.faults.delete.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, operation: &str) -> Result<(), DomainError> {
        if flag.load(Ordering::SeqCst) {
            return Err(DomainError::database(format!("Simulated {} failure", operation)));
        }
        Ok(())
    }
}

fn not_found(id: &CycleId) -> DomainError {
    DomainError::new(ErrorCode::CycleNotFound, format!("Cycle not found: {}", id))
}

#[async_trait]
impl CycleRepository for InMemoryCycleRepository {
    async fn create(&self, record: &CycleRecord) -> Result<CycleRecord, DomainError> {
        Self::check(&self.faults.create, "create")?;
        let mut records = self.records.write().await;
        let has_active = records
            .values()
            .any(|r| r.user_id == record.user_id && r.is_in_progress());
        if record.is_in_progress() && has_active {
            return Err(DomainError::new(
                ErrorCode::CycleAlreadyInProgress,
                format!("User {} already has a cycle in progress", record.user_id),
            )
            .with_detail("user_id", record.user_id.as_str()));
        }
        records.insert(record.id, record.clone());
        Ok(record.clone())
    }

    async fn update_dates(
        &self,
        id: &CycleId,
        dates: &CycleDates,
    ) -> Result<CycleRecord, DomainError> {
        Self::check(&self.faults.update, "update")?;
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .filter(|r| r.is_in_progress())
            .ok_or_else(|| not_found(id))?;
        record.reschedule(*dates);
        Ok(record.clone())
    }

    async fn complete(
        &self,
        id: &CycleId,
        dates: &CycleDates,
    ) -> Result<CycleRecord, DomainError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.faults.complete, "complete")?;
        let mut records = self.records.write().await;
        let record = records.get_mut(id).ok_or_else(|| not_found(id))?;
        record
            .complete(*dates)
            .map_err(|e| DomainError::new(ErrorCode::InvalidStateTransition, e.to_string()))?;
        Ok(record.clone())
    }

    async fn find_by_id(&self, id: &CycleId) -> Result<Option<CycleRecord>, DomainError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn find_in_progress(&self, user_id: &UserId) -> Result<Option<CycleRecord>, DomainError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|r| &r.user_id == user_id && r.is_in_progress())
            .cloned())
    }

    async fn find_last_completed(
        &self,
        user_id: &UserId,
    ) -> Result<Option<CycleRecord>, DomainError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| &r.user_id == user_id && r.status == CycleStatus::Completed)
            .max_by_key(|r| r.end_date)
            .cloned())
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<CycleRecord>, DomainError> {
        let mut cycles: Vec<CycleRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| &r.user_id == user_id)
            .cloned()
            .collect();
        cycles.sort_by_key(|r| std::cmp::Reverse(r.start_date));
        cycles.truncate(limit as usize);
        Ok(cycles)
    }

    async fn list_completed(&self, user_id: &UserId) -> Result<Vec<CycleRecord>, DomainError> {
        let mut cycles: Vec<CycleRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| &r.user_id == user_id && r.status == CycleStatus::Completed)
            .cloned()
            .collect();
        cycles.sort_by_key(|r| std::cmp::Reverse(r.start_date));
        Ok(cycles)
    }

    async fn delete(&self, id: &CycleId) -> Result<(), DomainError> {
        Self::check(&self.faults.delete, "delete")?;
        self.records
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    async fn delete_all_for_user(&self, user_id: &UserId) -> Result<u64, DomainError> {
        Self::check(&self.faults.delete, "delete")?;
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| &r.user_id != user_id);
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn dates(start_hour: i64, hours: i64) -> CycleDates {
        let base = Timestamp::parse_rfc3339("2024-01-01T00:00:00Z").unwrap();
        CycleDates::new(base.plus_hours(start_hour), base.plus_hours(start_hour + hours)).unwrap()
    }

    #[tokio::test]
    async fn rejects_second_in_progress_row_for_user() {
        let repo = InMemoryCycleRepository::new();
        repo.create(&CycleRecord::start(CycleId::new(), user("u1"), dates(0, 16)))
            .await
            .unwrap();

        let err = repo
            .create(&CycleRecord::start(CycleId::new(), user("u1"), dates(20, 16)))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::CycleAlreadyInProgress);
        assert!(repo
            .create(&CycleRecord::start(CycleId::new(), user("u2"), dates(0, 16)))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn update_dates_only_touches_in_progress_rows() {
        let repo = InMemoryCycleRepository::new();
        let record = CycleRecord::start(CycleId::new(), user("u1"), dates(0, 16));
        repo.create(&record).await.unwrap();

        let updated = repo.update_dates(&record.id, &dates(0, 18)).await.unwrap();
        assert_eq!(updated.dates().unwrap(), dates(0, 18));

        repo.complete(&record.id, &dates(0, 18)).await.unwrap();
        let err = repo.update_dates(&record.id, &dates(0, 20)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CycleNotFound);
    }

    #[tokio::test]
    async fn last_completed_is_latest_end_date() {
        let repo = InMemoryCycleRepository::new();
        for start in [0, 48, 24] {
            let id = CycleId::new();
            repo.create(&CycleRecord::start(id, user("u1"), dates(start, 16)))
                .await
                .unwrap();
            repo.complete(&id, &dates(start, 16)).await.unwrap();
        }

        let last = repo.find_last_completed(&user("u1")).await.unwrap().unwrap();
        assert_eq!(last.start_date, dates(48, 16).start_date());
    }

    #[tokio::test]
    async fn list_by_user_is_most_recent_first_and_limited() {
        let repo = InMemoryCycleRepository::new();
        for start in [0, 48, 24] {
            let mut record = CycleRecord::start(CycleId::new(), user("u1"), dates(start, 16));
            record.complete(dates(start, 16)).unwrap();
            repo.insert(record).await;
        }

        let listed = repo.list_by_user(&user("u1"), 2).await.unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].start_date, dates(48, 16).start_date());
        assert_eq!(listed[1].start_date, dates(24, 16).start_date());
    }

    #[tokio::test]
    async fn delete_all_for_user_counts_removed_rows() {
        let repo = InMemoryCycleRepository::new();
        repo.insert(CycleRecord::start(CycleId::new(), user("u1"), dates(0, 16))).await;
        repo.insert(CycleRecord::start(CycleId::new(), user("u2"), dates(0, 16))).await;

        assert_eq!(repo.delete_all_for_user(&user("u1")).await.unwrap(), 1);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn injected_failures_are_database_errors() {
        let repo = InMemoryCycleRepository::new();
        repo.fail_create(true);

        let err = repo
            .create(&CycleRecord::start(CycleId::new(), user("u1"), dates(0, 16)))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(repo.is_empty().await);
    }
}
