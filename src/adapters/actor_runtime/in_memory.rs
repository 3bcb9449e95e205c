//! In-memory actor runtime for tests and local development.
//!
//! Holds snapshots and the active-cycle index in process. Admission in
//! `try_start_new_cycle` happens under a single lock, so concurrent calls
//! for the same user see exactly one winner.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::cycle::{CycleDates, CycleSnapshot};
use crate::domain::foundation::{CycleId, UserId};
use crate::ports::{ActiveCycleIndex, ActiveCycleRef, ActorRuntimeError, SnapshotStore};

#[derive(Debug, Default)]
struct Faults {
    persist: AtomicBool,
    start: AtomicBool,
    mark_complete: AtomicBool,
}

#[derive(Debug, Default)]
struct Counters {
    persist: AtomicUsize,
    mark_complete: AtomicUsize,
}

/// In-memory implementation of both actor-runtime ports.
#[derive(Debug, Clone, Default)]
pub struct InMemoryActorRuntime {
    snapshots: Arc<RwLock<HashMap<UserId, CycleSnapshot>>>,
    active: Arc<RwLock<HashMap<UserId, ActiveCycleRef>>>,
    faults: Arc<Faults>,
    counters: Arc<Counters>,
}

impl InMemoryActorRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a snapshot without counting it as a persist.
    pub async fn seed_snapshot(&self, user_id: &UserId, snapshot: CycleSnapshot) {
        self.snapshots.write().await.insert(user_id.clone(), snapshot);
    }

    /// Seed an index reservation.
    pub async fn seed_active(&self, user_id: &UserId, cycle_id: CycleId) {
        self.active.write().await.insert(
            user_id.clone(),
            ActiveCycleRef {
                cycle_id,
                user_id: user_id.clone(),
            },
        );
    }

    /// Last persisted snapshot for a user, if any.
    pub async fn stored_snapshot(&self, user_id: &UserId) -> Option<CycleSnapshot> {
        self.snapshots.read().await.get(user_id).cloned()
    }

    /// Current reservation for a user, if any.
    pub async fn active_for(&self, user_id: &UserId) -> Option<CycleId> {
        self.active.read().await.get(user_id).map(|r| r.cycle_id)
    }

    pub fn persist_calls(&self) -> usize {
        self.counters.persist.load(Ordering::SeqCst)
    }

    pub fn mark_complete_calls(&self) -> usize {
        self.counters.mark_complete.load(Ordering::SeqCst)
    }

    pub fn fail_persist(&self, fail: bool) {
        self.faults.persist.store(fail, Ordering::SeqCst);
    }

    pub fn fail_start(&self, fail: bool) {
        self.faults.start.store(fail, Ordering::SeqCst);
    }

    pub fn fail_mark_complete(&self, fail: bool) {
        self.faults.mark_complete.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, operation: &str) -> Result<(), ActorRuntimeError> {
        if flag.load(Ordering::SeqCst) {
            return Err(ActorRuntimeError::Client(format!(
                "Simulated {} failure",
                operation
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for InMemoryActorRuntime {
    async fn get(&self, user_id: &UserId) -> Result<CycleSnapshot, ActorRuntimeError> {
        self.snapshots
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| ActorRuntimeError::NotFound(user_id.to_string()))
    }

    async fn persist(
        &self,
        user_id: &UserId,
        snapshot: &CycleSnapshot,
    ) -> Result<(), ActorRuntimeError> {
        Self::check(&self.faults.persist, "persist")?;
        self.snapshots
            .write()
            .await
            .insert(user_id.clone(), snapshot.clone());
        self.counters.persist.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ActiveCycleIndex for InMemoryActorRuntime {
    async fn try_start_new_cycle(
        &self,
        user_id: &UserId,
        cycle_id: &CycleId,
        _dates: &CycleDates,
    ) -> Result<bool, ActorRuntimeError> {
        Self::check(&self.faults.start, "start")?;
        let mut active = self.active.write().await;
        if active.contains_key(user_id) {
            return Ok(false);
        }
        active.insert(
            user_id.clone(),
            ActiveCycleRef {
                cycle_id: *cycle_id,
                user_id: user_id.clone(),
            },
        );
        Ok(true)
    }

    async fn get_active(&self, user_id: &UserId) -> Result<ActiveCycleRef, ActorRuntimeError> {
        self.active
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| ActorRuntimeError::NotFound(user_id.to_string()))
    }

    async fn mark_complete(&self, cycle_id: &CycleId) -> Result<(), ActorRuntimeError> {
        self.counters.mark_complete.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.faults.mark_complete, "mark complete")?;
        let mut active = self.active.write().await;
        let before = active.len();
        active.retain(|_, reservation| &reservation.cycle_id != cycle_id);
        if active.len() == before {
            return Err(ActorRuntimeError::NotFound(cycle_id.to_string()));
        }
        Ok(())
    }
}
