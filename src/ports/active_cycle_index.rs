//! Active-cycle index port.
//!
//! A second per-user grain that admits at most one active cycle. It is the
//! authoritative admission-control gate; the cache and the read model only
//! mirror it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::cycle::CycleDates;
use crate::domain::foundation::{CycleId, UserId};

use super::ActorRuntimeError;

/// The cycle currently registered as active for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCycleRef {
    pub cycle_id: CycleId,
    pub user_id: UserId,
}

#[async_trait]
pub trait ActiveCycleIndex: Send + Sync {
    /// Register `cycle_id` as the user's active cycle.
    ///
    /// Returns `Ok(false)` when the user already has an active cycle; that
    /// is an admission decision, not an error.
    async fn try_start_new_cycle(
        &self,
        user_id: &UserId,
        cycle_id: &CycleId,
        dates: &CycleDates,
    ) -> Result<bool, ActorRuntimeError>;

    /// Fetch the user's active cycle.
    ///
    /// # Errors
    ///
    /// `NotFound` if the user has no active cycle.
    async fn get_active(&self, user_id: &UserId) -> Result<ActiveCycleRef, ActorRuntimeError>;

    /// Release the active registration of `cycle_id`.
    async fn mark_complete(&self, cycle_id: &CycleId) -> Result<(), ActorRuntimeError>;
}
