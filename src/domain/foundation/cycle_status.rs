//! CycleStatus enum for the read-model status of a fasting cycle.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::state_machine::StateMachine;

/// Read-model status of a fasting cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CycleStatus {
    #[default]
    InProgress,
    Completed,
}

impl CycleStatus {
    /// Returns true if the cycle is still running.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, CycleStatus::InProgress)
    }

    /// Column value used by the relational read model.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            CycleStatus::InProgress => "in_progress",
            CycleStatus::Completed => "completed",
        }
    }

    /// Parses a column value written by [`CycleStatus::as_db_str`].
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(CycleStatus::InProgress),
            "completed" => Some(CycleStatus::Completed),
            _ => None,
        }
    }
}

impl StateMachine for CycleStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!((self, target), (CycleStatus::InProgress, CycleStatus::Completed))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            CycleStatus::InProgress => vec![CycleStatus::Completed],
            CycleStatus::Completed => vec![],
        }
    }
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CycleStatus::InProgress => "InProgress",
            CycleStatus::Completed => "Completed",
        };
        write!(f, "{}", s)
    }
}
