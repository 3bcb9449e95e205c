//! Machine runtime - one spawned task per in-flight operation.
//!
//! The task owns a `CycleMachine`, reads events from an inbox, applies the
//! pure transition, runs any requested effect and feeds the outcome back in
//! as the next event. Every signal goes out together with the snapshot of
//! the machine that produced it, in transition order.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::domain::cycle::{
    CycleError, CycleMachine, CycleSnapshot, LifecycleEvent, LifecycleState, Signal,
};

use super::effects::CycleEffects;

const INBOX_DEPTH: usize = 8;
const SIGNAL_DEPTH: usize = 8;

/// A signal paired with the machine state it was emitted from.
#[derive(Debug, Clone)]
pub struct Emitted {
    pub signal: Signal,
    pub snapshot: CycleSnapshot,
}

/// Handle to a running machine. Dropping it stops the task.
pub struct CycleActor {
    inbox: mpsc::Sender<LifecycleEvent>,
    signals: Option<mpsc::Receiver<Emitted>>,
    state: watch::Receiver<LifecycleState>,
    task: JoinHandle<()>,
}

impl CycleActor {
    /// Spawns the runtime task for `machine`.
    pub fn spawn(machine: CycleMachine, effects: Arc<CycleEffects>) -> Self {
        let (inbox, inbox_rx) = mpsc::channel(INBOX_DEPTH);
        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_DEPTH);
        let (state_tx, state) = watch::channel(machine.state());
        let task = tokio::spawn(run(machine, effects, inbox_rx, signal_tx, state_tx));

        Self {
            inbox,
            signals: Some(signal_rx),
            state,
            task,
        }
    }

    /// Takes the signal stream. Subscribe before the first `send` so no
    /// signal is missed; later calls return `None`.
    pub fn subscribe(&mut self) -> Option<mpsc::Receiver<Emitted>> {
        self.signals.take()
    }

    /// Queues an event for the machine.
    ///
    /// # Errors
    ///
    /// `CycleInvalidState` if the machine has already stopped.
    pub async fn send(&self, event: LifecycleEvent) -> Result<(), CycleError> {
        let operation = event.name();
        self.inbox
            .send(event)
            .await
            .map_err(|_| CycleError::invalid_state(self.state(), operation))
    }

    /// Last state the machine settled in.
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Stops the machine. No effect starts after this returns.
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for CycleActor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    mut machine: CycleMachine,
    effects: Arc<CycleEffects>,
    mut inbox: mpsc::Receiver<LifecycleEvent>,
    signals: mpsc::Sender<Emitted>,
    settled: watch::Sender<LifecycleState>,
) {
    while let Some(event) = inbox.recv().await {
        let mut next = Some(event);

        while let Some(event) = next.take() {
            let name = event.name();
            let state = machine.state();

            let transition = match machine.clone().transition(event) {
                Ok(transition) => transition,
                Err(error) => {
                    tracing::debug!(state = %state, event = name, "Event rejected by cycle machine");
                    let emitted = Emitted {
                        signal: Signal::Error { error },
                        snapshot: machine.snapshot(),
                    };
                    if signals.send(emitted).await.is_err() {
                        return;
                    }
                    continue;
                }
            };

            machine = transition.machine;
            settled.send_replace(machine.state());
            tracing::debug!(from = %state, to = %machine.state(), event = name, "Cycle machine transition");

            if let Some(signal) = transition.signal {
                let emitted = Emitted {
                    signal,
                    snapshot: machine.snapshot(),
                };
                if signals.send(emitted).await.is_err() {
                    return;
                }
            }

            if let Some(effect) = transition.effect {
                next = Some(effects.run(effect).await);
            }
        }
    }
}
