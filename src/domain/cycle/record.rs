//! Read-model record for a fasting cycle.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CycleId, CycleStatus, StateMachine, Timestamp, UserId, ValidationError,
};

use super::CycleDates;

/// Row of the `cycles` table, the durable system of record consumed by
/// history and statistics views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleRecord {
    pub id: CycleId,
    pub user_id: UserId,
    pub status: CycleStatus,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CycleRecord {
    /// Creates a new in-progress record.
    pub fn start(id: CycleId, user_id: UserId, dates: CycleDates) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            user_id,
            status: CycleStatus::InProgress,
            start_date: dates.start_date(),
            end_date: dates.end_date(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The record's interval.
    pub fn dates(&self) -> Result<CycleDates, ValidationError> {
        CycleDates::new(self.start_date, self.end_date)
    }

    pub fn is_in_progress(&self) -> bool {
        self.status.is_in_progress()
    }

    /// Replaces the interval of a running cycle.
    pub fn reschedule(&mut self, dates: CycleDates) {
        self.start_date = dates.start_date();
        self.end_date = dates.end_date();
        self.updated_at = Timestamp::now();
    }

    /// Marks the cycle completed with its final interval.
    ///
    /// Completing an already completed record only refreshes the dates, so
    /// a retried completion converges instead of failing.
    pub fn complete(&mut self, dates: CycleDates) -> Result<(), ValidationError> {
        if self.status != CycleStatus::Completed {
            self.status = self.status.transition_to(CycleStatus::Completed)?;
        }
        self.reschedule(dates);
        Ok(())
    }
}
