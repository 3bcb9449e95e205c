//! Failure taxonomy crossing the lifecycle service boundary.
//!
//! Every public lifecycle operation resolves to a success payload or exactly
//! one of these variants.

use thiserror::Error;

use crate::domain::foundation::{CycleId, DomainError, ErrorCode, UserId, ValidationError};

use super::LifecycleState;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CycleError {
    /// Admission denied: the user already has an active or creating cycle.
    #[error("User {user_id} already has a cycle in progress")]
    AlreadyInProgress { user_id: UserId },

    /// The caller referenced a cycle that is not the user's current one.
    #[error("Cycle {requested} is not the current cycle ({})", display_active(.active))]
    CycleIdMismatch {
        requested: CycleId,
        active: Option<CycleId>,
    },

    /// The operation is not valid in the machine's current state.
    #[error("Cannot {operation} while the cycle machine is {state:?}")]
    CycleInvalidState {
        state: LifecycleState,
        operation: &'static str,
    },

    /// No matching record in the read model.
    #[error("Cycle not found: {0}")]
    CycleNotFound(String),

    /// Database failure in the read model.
    #[error("Repository error: {0}")]
    Repository(String),

    /// Transport, non-2xx or decoding failure against the actor runtime.
    #[error("Remote client error: {0}")]
    RemoteClient(String),

    /// The actor runtime answered 404.
    #[error("Remote grain not found: {0}")]
    RemoteNotFound(String),

    /// Cache write failed.
    #[error("Cache error: {0}")]
    Cache(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

fn display_active(active: &Option<CycleId>) -> String {
    active
        .map(|id| id.to_string())
        .unwrap_or_else(|| "none".to_string())
}

impl CycleError {
    /// Stable code for mapping onto transport status codes.
    pub fn code(&self) -> ErrorCode {
        match self {
            CycleError::AlreadyInProgress { .. } => ErrorCode::CycleAlreadyInProgress,
            CycleError::CycleIdMismatch { .. } => ErrorCode::CycleIdMismatch,
            CycleError::CycleInvalidState { .. } => ErrorCode::InvalidStateTransition,
            CycleError::CycleNotFound(_) => ErrorCode::CycleNotFound,
            CycleError::Repository(_) => ErrorCode::DatabaseError,
            CycleError::RemoteClient(_) => ErrorCode::RemoteClientError,
            CycleError::RemoteNotFound(_) => ErrorCode::RemoteNotFound,
            CycleError::Cache(_) => ErrorCode::CacheError,
            CycleError::Validation(_) => ErrorCode::ValidationFailed,
        }
    }

    pub fn invalid_state(state: LifecycleState, operation: &'static str) -> Self {
        CycleError::CycleInvalidState { state, operation }
    }
}

impl From<DomainError> for CycleError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::CycleNotFound => CycleError::CycleNotFound(err.message),
            ErrorCode::CycleAlreadyInProgress => match err
                .details
                .get("user_id")
                .and_then(|id| UserId::new(id.clone()).ok())
            {
                Some(user_id) => CycleError::AlreadyInProgress { user_id },
                None => CycleError::Repository(err.to_string()),
            },
            _ => CycleError::Repository(err.to_string()),
        }
    }
}
