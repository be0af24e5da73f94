//! Workflow run state machine.
//!
//! ```text
//! Idle ──Begin──► RunningStep(1) ──StepSucceeded──► RunningStep(2) ... RunningStep(N)
//!                      │                                                  │
//!                      ├──StepFailed───► Failed                           └──StepSucceeded──► Succeeded
//!                      └──StepTimedOut─► TimedOut
//! ```
//!
//! `Succeeded`, `Failed` and `TimedOut` are terminal.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    /// 1-based index of the step in flight
    RunningStep(usize),
    Succeeded,
    Failed,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Begin,
    StepSucceeded,
    StepFailed,
    StepTimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid workflow transition {transition:?} from {from}")]
pub struct InvalidTransition {
    pub from: WorkflowState,
    pub transition: Transition,
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::TimedOut)
    }

    /// Apply `transition` to a chain of `total_steps` steps.
    pub fn advance(
        self,
        transition: Transition,
        total_steps: usize,
    ) -> Result<WorkflowState, InvalidTransition> {
        let next = match (self, transition) {
            (Self::Idle, Transition::Begin) if total_steps > 0 => Self::RunningStep(1),
            (Self::RunningStep(i), Transition::StepSucceeded) if i < total_steps => {
                Self::RunningStep(i + 1)
            }
            (Self::RunningStep(i), Transition::StepSucceeded) if i == total_steps => {
                Self::Succeeded
            }
            (Self::RunningStep(_), Transition::StepFailed) => Self::Failed,
            (Self::RunningStep(_), Transition::StepTimedOut) => Self::TimedOut,
            (from, transition) => return Err(InvalidTransition { from, transition }),
        };
        Ok(next)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::RunningStep(i) => write!(f, "running step {}", i),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::TimedOut => write!(f, "timed out"),
        }
    }
}
