//! Cycle lifecycle state machine.
//!
//! One machine instance drives one in-flight operation (create, update dates
//! or complete). The transition function is pure: it returns the next
//! machine together with the side effect to run and the signal to emit, and
//! the runtime in `application::lifecycle` executes them.
//!
//! ```text
//! Idle ──CREATE_CYCLE──▶ Creating ──ok──▶ InProgress ──COMPLETE──▶ Completing ──ok──▶ Completed
//!  ▲                        │                 │  ▲                      │                 │
//!  └──────────failed────────┘      UPDATE_DATES  └──ok / failed──┐      └──failed──▶ InProgress
//!  ▲                                          ▼                  │                        │
//!  └───────────────RESET──────────────── Updating ───────────────┘          RESET ◀───────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{CycleId, StateMachine, Timestamp, UserId};

use super::{CycleDates, CycleError, CycleRecord};

/// States of the lifecycle machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    Creating,
    InProgress,
    Updating,
    Completing,
    Completed,
}

impl LifecycleState {
    /// True while a side effect is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            LifecycleState::Creating | LifecycleState::Updating | LifecycleState::Completing
        )
    }

    /// True when the user has a cycle that blocks starting another one.
    pub fn blocks_new_cycle(&self) -> bool {
        !matches!(self, LifecycleState::Idle | LifecycleState::Completed)
    }
}

impl StateMachine for LifecycleState {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use LifecycleState::*;
        match self {
            Idle => vec![Creating, Idle],
            Creating => vec![InProgress, Idle],
            InProgress => vec![Updating, Completing],
            Updating => vec![InProgress],
            Completing => vec![Completed, InProgress],
            Completed => vec![Idle],
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// In-memory machine context, populated by transition actions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleContext {
    pub id: Option<CycleId>,
    /// Older snapshots keyed the owner as `actorId`.
    #[serde(alias = "actorId")]
    pub user_id: Option<UserId>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
}

impl CycleContext {
    fn from_record(record: &CycleRecord) -> Self {
        Self {
            id: Some(record.id),
            user_id: Some(record.user_id.clone()),
            start_date: Some(record.start_date),
            end_date: Some(record.end_date),
        }
    }
}

/// Events accepted by the machine.
///
/// The first four are sent by callers; the rest report the outcome of an
/// [`Effect`] back into the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    CreateCycle { user_id: UserId, dates: CycleDates },
    UpdateDates { dates: CycleDates },
    Complete { dates: CycleDates },
    Reset,
    CreateSucceeded { record: CycleRecord },
    CreateFailed { error: CycleError },
    UpdateSucceeded { record: CycleRecord },
    UpdateFailed { error: CycleError },
    CompleteSucceeded { record: CycleRecord },
    CompleteFailed { error: CycleError },
}

impl LifecycleEvent {
    /// Wire-style event name, used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::CreateCycle { .. } => "CREATE_CYCLE",
            LifecycleEvent::UpdateDates { .. } => "UPDATE_DATES",
            LifecycleEvent::Complete { .. } => "COMPLETE",
            LifecycleEvent::Reset => "RESET",
            LifecycleEvent::CreateSucceeded { .. } => "CREATE_SUCCEEDED",
            LifecycleEvent::CreateFailed { .. } => "CREATE_FAILED",
            LifecycleEvent::UpdateSucceeded { .. } => "UPDATE_SUCCEEDED",
            LifecycleEvent::UpdateFailed { .. } => "UPDATE_FAILED",
            LifecycleEvent::CompleteSucceeded { .. } => "COMPLETE_SUCCEEDED",
            LifecycleEvent::CompleteFailed { .. } => "COMPLETE_FAILED",
        }
    }
}

/// Side effect requested by a transition, executed outside the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    CreateCycle {
        user_id: UserId,
        dates: CycleDates,
    },
    UpdateDates {
        cycle_id: CycleId,
        user_id: UserId,
        dates: CycleDates,
    },
    CompleteCycle {
        cycle_id: CycleId,
        user_id: UserId,
        dates: CycleDates,
    },
}

/// Signal emitted by a transition for whoever is driving the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// The machine reached a stable state that must be durably stored.
    Persist { cycle_id: CycleId },
    /// A side effect failed.
    Error { error: CycleError },
}

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub machine: CycleMachine,
    pub effect: Option<Effect>,
    pub signal: Option<Signal>,
}

/// Machine value: current state plus context.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CycleMachine {
    state: LifecycleState,
    context: CycleContext,
}

impl CycleMachine {
    /// Fresh machine in `Idle` with an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(state: LifecycleState, context: CycleContext) -> Self {
        Self { state, context }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn context(&self) -> &CycleContext {
        &self.context
    }

    /// Cycle id stored in the context, if the machine ever created one.
    pub fn cycle_id(&self) -> Option<CycleId> {
        self.context.id
    }

    /// Applies `event` and returns the next machine with the work it requests.
    ///
    /// # Errors
    ///
    /// `CycleInvalidState` when the event is not accepted in the current
    /// state, or the context lacks what the event needs.
    pub fn transition(self, event: LifecycleEvent) -> Result<Transition, CycleError> {
        use LifecycleState::*;

        let operation = event.name();
        let state = self.state;
        let reject = || CycleError::invalid_state(state, operation);

        let (next, context, effect, signal) = match (state, event) {
            (Idle, LifecycleEvent::CreateCycle { user_id, dates }) => {
                let context = CycleContext {
                    id: None,
                    user_id: Some(user_id.clone()),
                    start_date: Some(dates.start_date()),
                    end_date: Some(dates.end_date()),
                };
                (Creating, context, Some(Effect::CreateCycle { user_id, dates }), None)
            }
            (Creating, LifecycleEvent::CreateSucceeded { record }) => {
                let signal = Signal::Persist {
                    cycle_id: record.id,
                };
                (InProgress, CycleContext::from_record(&record), None, Some(signal))
            }
            (Creating, LifecycleEvent::CreateFailed { error }) => {
                (Idle, CycleContext::default(), None, Some(Signal::Error { error }))
            }
            (InProgress, LifecycleEvent::UpdateDates { dates }) => {
                let (cycle_id, user_id) = self.owned_cycle().ok_or_else(reject)?;
                let effect = Effect::UpdateDates {
                    cycle_id,
                    user_id,
                    dates,
                };
                (Updating, self.context.clone(), Some(effect), None)
            }
            (Updating, LifecycleEvent::UpdateSucceeded { record }) => {
                let signal = Signal::Persist {
                    cycle_id: record.id,
                };
                (InProgress, CycleContext::from_record(&record), None, Some(signal))
            }
            (Updating, LifecycleEvent::UpdateFailed { error }) => {
                (InProgress, self.context.clone(), None, Some(Signal::Error { error }))
            }
            (InProgress, LifecycleEvent::Complete { dates }) => {
                let (cycle_id, user_id) = self.owned_cycle().ok_or_else(reject)?;
                let effect = Effect::CompleteCycle {
                    cycle_id,
                    user_id,
                    dates,
                };
                (Completing, self.context.clone(), Some(effect), None)
            }
            (Completing, LifecycleEvent::CompleteSucceeded { record }) => {
                let signal = Signal::Persist {
                    cycle_id: record.id,
                };
                (Completed, CycleContext::from_record(&record), None, Some(signal))
            }
            (Completing, LifecycleEvent::CompleteFailed { error }) => {
                (InProgress, self.context.clone(), None, Some(Signal::Error { error }))
            }
            (Idle | Completed, LifecycleEvent::Reset) => (Idle, CycleContext::default(), None, None),
            _ => return Err(reject()),
        };

        state
            .transition_to(next)
            .map_err(|_| CycleError::invalid_state(state, operation))?;

        Ok(Transition {
            machine: CycleMachine {
                state: next,
                context,
            },
            effect,
            signal,
        })
    }

    fn owned_cycle(&self) -> Option<(CycleId, UserId)> {
        Some((self.context.id?, self.context.user_id.clone()?))
    }
}
