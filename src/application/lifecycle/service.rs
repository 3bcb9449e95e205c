//! CycleLifecycleService - public entry point for cycle lifecycle operations.
//!
//! Each operation builds a machine (fresh, or restored from the user's
//! snapshot), sends it one event and waits for the outcome:
//!
//! 1. the signal stream is taken before the event is sent;
//! 2. an `Error` signal resolves the operation with that error;
//! 3. a `Persist` signal pushes the attached snapshot to the snapshot store,
//!    and only after the store acknowledges is the snapshot queued for
//!    confirmation; a failed create-time persist rolls the new cycle back;
//! 4. the confirmation consumer resolves the operation with the snapshot.
//!
//! The first resolution wins. Afterwards both tasks are aborted and the
//! machine is stopped, so no side effect runs once the caller has a result.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::cache::RefCache;
use crate::domain::cycle::{
    CycleDates, CycleError, CycleMachine, CycleSnapshot, LifecycleEvent, LifecycleState, Signal,
};
use crate::domain::foundation::{CycleId, Timestamp, UserId};
use crate::ports::{ActiveCycleIndex, ActorRuntimeError, CycleRepository, SnapshotStore};

use super::actor::{CycleActor, Emitted};
use super::completion::Completion;
use super::effects::CycleEffects;

const CONFIRM_DEPTH: usize = 4;

type Outcome = Result<CycleSnapshot, CycleError>;

/// Orchestrates create, update and complete across the snapshot store, the
/// active-cycle index, the read model and the cache.
pub struct CycleLifecycleService {
    snapshots: Arc<dyn SnapshotStore>,
    index: Arc<dyn ActiveCycleIndex>,
    effects: Arc<CycleEffects>,
}

impl CycleLifecycleService {
    pub fn new(
        snapshots: Arc<dyn SnapshotStore>,
        index: Arc<dyn ActiveCycleIndex>,
        repository: Arc<dyn CycleRepository>,
        cache: Arc<RefCache>,
    ) -> Self {
        let effects = Arc::new(CycleEffects::new(index.clone(), repository, cache));
        Self {
            snapshots,
            index,
            effects,
        }
    }

    /// Starts a new cycle for `user_id`.
    ///
    /// # Errors
    ///
    /// - `Validation` if `end_date` is not after `start_date`
    /// - `AlreadyInProgress` if the index or the stored machine shows an
    ///   active cycle, or the index refuses the reservation
    /// - `Repository`, `RemoteClient` or `Cache` from the create effect
    pub async fn create_cycle(
        &self,
        user_id: &UserId,
        start_date: Timestamp,
        end_date: Timestamp,
    ) -> Outcome {
        let dates = CycleDates::new(start_date, end_date)?;
        tracing::debug!(user_id = %user_id, "create_cycle");

        match self.index.get_active(user_id).await {
            Ok(active) => {
                tracing::info!(user_id = %user_id, cycle_id = %active.cycle_id, "Rejecting create, cycle already active");
                return Err(CycleError::AlreadyInProgress {
                    user_id: user_id.clone(),
                });
            }
            Err(ActorRuntimeError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        if let Some(snapshot) = self.stored_snapshot(user_id).await? {
            let machine = CycleMachine::restore(&snapshot)?;
            if machine.state().blocks_new_cycle() {
                tracing::info!(user_id = %user_id, state = %machine.state(), "Rejecting create, stored machine is active");
                return Err(CycleError::AlreadyInProgress {
                    user_id: user_id.clone(),
                });
            }
        }

        self.drive(
            user_id,
            CycleMachine::new(),
            LifecycleEvent::CreateCycle {
                user_id: user_id.clone(),
                dates,
            },
        )
        .await
    }

    /// Replaces the dates of the user's running cycle.
    ///
    /// # Errors
    ///
    /// - `RemoteNotFound` if the user has no snapshot
    /// - `CycleIdMismatch` if `cycle_id` is not the stored cycle
    /// - `CycleInvalidState` unless the stored machine is `InProgress`
    /// - `Repository` / `RemoteClient` from the update or the persist
    pub async fn update_cycle_dates(
        &self,
        user_id: &UserId,
        cycle_id: &CycleId,
        start_date: Timestamp,
        end_date: Timestamp,
    ) -> Outcome {
        let dates = CycleDates::new(start_date, end_date)?;
        tracing::debug!(user_id = %user_id, cycle_id = %cycle_id, "update_cycle_dates");

        let machine = self.restore_for(user_id, cycle_id).await?.0;
        if machine.state() != LifecycleState::InProgress {
            return Err(CycleError::invalid_state(machine.state(), "UPDATE_DATES"));
        }

        self.drive(user_id, machine, LifecycleEvent::UpdateDates { dates })
            .await
    }

    /// Completes the user's running cycle with its final dates. Completing
    /// an already completed cycle returns the stored snapshot untouched.
    ///
    /// # Errors
    ///
    /// - `RemoteNotFound` if the user has no snapshot
    /// - `CycleIdMismatch` if `cycle_id` is not the stored cycle
    /// - `CycleInvalidState` if the stored machine cannot complete
    /// - `Repository` / `RemoteClient` from the completion or the persist
    pub async fn complete_cycle(
        &self,
        user_id: &UserId,
        cycle_id: &CycleId,
        start_date: Timestamp,
        end_date: Timestamp,
    ) -> Outcome {
        let dates = CycleDates::new(start_date, end_date)?;
        tracing::debug!(user_id = %user_id, cycle_id = %cycle_id, "complete_cycle");

        let (machine, snapshot) = self.restore_for(user_id, cycle_id).await?;
        if machine.state() == LifecycleState::Completed {
            tracing::debug!(user_id = %user_id, cycle_id = %cycle_id, "Cycle already completed");
            return Ok(snapshot);
        }

        self.drive(user_id, machine, LifecycleEvent::Complete { dates })
            .await
    }

    /// Current stored snapshot for the user.
    ///
    /// # Errors
    ///
    /// `RemoteNotFound` if the user has none; `RemoteClient` otherwise.
    pub async fn get_cycle_state(&self, user_id: &UserId) -> Outcome {
        Ok(self.snapshots.get(user_id).await?)
    }

    // ════════════════════════════════════════════════════════════════════════
    // Completion protocol
    // ════════════════════════════════════════════════════════════════════════

    async fn drive(
        &self,
        user_id: &UserId,
        machine: CycleMachine,
        event: LifecycleEvent,
    ) -> Outcome {
        let operation = event.name();
        let creating = matches!(event, LifecycleEvent::CreateCycle { .. });
        let start_state = machine.state();

        let mut actor = CycleActor::spawn(machine, self.effects.clone());
        let signals = actor
            .subscribe()
            .ok_or_else(|| CycleError::invalid_state(start_state, operation))?;

        let (completion, result) = Completion::new();
        let completion = Arc::new(completion);
        let (confirm_tx, confirm_rx) = mpsc::channel(CONFIRM_DEPTH);

        let listener = tokio::spawn(listen(
            signals,
            self.snapshots.clone(),
            self.effects.clone(),
            user_id.clone(),
            creating,
            completion.clone(),
            confirm_tx,
        ));
        let confirmer = tokio::spawn(confirm(confirm_rx, completion.clone()));

        if let Err(e) = actor.send(event).await {
            completion.resolve(Err(e));
        }
        // The tasks hold the remaining handles; if both exit unresolved the
        // receiver sees the slot closed.
        drop(completion);

        let outcome = match result.await {
            Ok(outcome) => outcome,
            Err(_) => Err(CycleError::invalid_state(actor.state(), operation)),
        };

        listener.abort();
        confirmer.abort();
        actor.stop();

        match &outcome {
            Ok(snapshot) => {
                tracing::debug!(user_id = %user_id, state = %snapshot.value, operation, "Lifecycle operation confirmed")
            }
            Err(e) => {
                tracing::debug!(user_id = %user_id, error = %e, operation, "Lifecycle operation failed")
            }
        }
        outcome
    }

    async fn stored_snapshot(&self, user_id: &UserId) -> Result<Option<CycleSnapshot>, CycleError> {
        match self.snapshots.get(user_id).await {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(ActorRuntimeError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetches the snapshot, checks it refers to `cycle_id` and restores it.
    async fn restore_for(
        &self,
        user_id: &UserId,
        cycle_id: &CycleId,
    ) -> Result<(CycleMachine, CycleSnapshot), CycleError> {
        let snapshot = self.snapshots.get(user_id).await?;

        if snapshot.cycle_id() != Some(*cycle_id) {
            tracing::info!(
                user_id = %user_id,
                requested = %cycle_id,
                "Rejecting stale cycle reference"
            );
            return Err(CycleError::CycleIdMismatch {
                requested: *cycle_id,
                active: snapshot.cycle_id(),
            });
        }

        let machine = CycleMachine::restore(&snapshot)?;
        Ok((machine, snapshot))
    }
}

async fn listen(
    mut signals: mpsc::Receiver<Emitted>,
    store: Arc<dyn SnapshotStore>,
    effects: Arc<CycleEffects>,
    user_id: UserId,
    creating: bool,
    completion: Arc<Completion<Outcome>>,
    confirmations: mpsc::Sender<CycleSnapshot>,
) {
    while let Some(Emitted { signal, snapshot }) = signals.recv().await {
        match signal {
            Signal::Error { error } => {
                completion.resolve(Err(error));
                return;
            }
            Signal::Persist { cycle_id } => {
                if let Err(e) = store.persist(&user_id, &snapshot).await {
                    tracing::warn!(user_id = %user_id, cycle_id = %cycle_id, error = %e, "Snapshot persist failed");
                    // Without a snapshot the new cycle is unreachable.
                    if creating && snapshot.value == LifecycleState::InProgress {
                        effects.compensate_create(&cycle_id, &user_id).await;
                    }
                    completion.resolve(Err(CycleError::RemoteClient(e.to_string())));
                    return;
                }
                tracing::debug!(user_id = %user_id, cycle_id = %cycle_id, state = %snapshot.value, "Snapshot persisted");
                if confirmations.send(snapshot).await.is_err() {
                    return;
                }
            }
        }
    }
}

async fn confirm(
    mut confirmations: mpsc::Receiver<CycleSnapshot>,
    completion: Arc<Completion<Outcome>>,
) {
    if let Some(snapshot) = confirmations.recv().await {
        completion.resolve(Ok(snapshot));
    }
}
