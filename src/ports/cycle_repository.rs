//! Cycle repository port (read model).
//!
//! Defines the contract for the relational `cycles` table consumed by the
//! history and statistics views.
//!
//! # Design
//!
//! - **Single active row**: implementations reject a second `InProgress`
//!   record for a user with `CycleAlreadyInProgress`
//! - **Soft status, hard delete**: records move to `Completed`; only
//!   completed records or whole accounts are deleted

use async_trait::async_trait;

use crate::domain::cycle::{CycleDates, CycleRecord};
use crate::domain::foundation::{CycleId, DomainError, UserId};

/// Repository port for cycle records.
#[async_trait]
pub trait CycleRepository: Send + Sync {
    /// Insert a new record.
    ///
    /// # Errors
    ///
    /// - `CycleAlreadyInProgress` if the user already has an in-progress row
    /// - `DatabaseError` on persistence failure
    async fn create(&self, record: &CycleRecord) -> Result<CycleRecord, DomainError>;

    /// Replace the dates of an in-progress cycle.
    ///
    /// # Errors
    ///
    /// - `CycleNotFound` if no in-progress cycle with this id exists
    /// - `DatabaseError` on persistence failure
    async fn update_dates(
        &self,
        id: &CycleId,
        dates: &CycleDates,
    ) -> Result<CycleRecord, DomainError>;

    /// Mark a cycle completed with its final dates. Completing an already
    /// completed cycle rewrites its dates and succeeds.
    ///
    /// # Errors
    ///
    /// - `CycleNotFound` if the cycle doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn complete(&self, id: &CycleId, dates: &CycleDates)
        -> Result<CycleRecord, DomainError>;

    /// Find a cycle by its ID.
    async fn find_by_id(&self, id: &CycleId) -> Result<Option<CycleRecord>, DomainError>;

    /// Find the user's in-progress cycle, if any.
    async fn find_in_progress(&self, user_id: &UserId) -> Result<Option<CycleRecord>, DomainError>;

    /// Find the user's completed cycle with the latest end date.
    async fn find_last_completed(
        &self,
        user_id: &UserId,
    ) -> Result<Option<CycleRecord>, DomainError>;

    /// List the user's cycles, most recent start first.
    async fn list_by_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<CycleRecord>, DomainError>;

    /// List every completed cycle of the user.
    async fn list_completed(&self, user_id: &UserId) -> Result<Vec<CycleRecord>, DomainError>;

    /// Delete a single record.
    ///
    /// # Errors
    ///
    /// - `CycleNotFound` if the cycle doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn delete(&self, id: &CycleId) -> Result<(), DomainError>;

    /// Delete every record of a user (account deletion). Returns the count.
    async fn delete_all_for_user(&self, user_id: &UserId) -> Result<u64, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn CycleRepository) {}
    }
}
