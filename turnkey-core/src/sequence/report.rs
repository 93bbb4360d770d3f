//! Reports and events emitted by the engine

use crate::config::{GroupCursor, Label, StepKind, StepPath};
use crate::state::InvalidTransition;
use crate::traits::EntityId;

use super::error::EngineError;

/// How a step ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepOutcome {
    /// The completion condition was met
    Completed { reason: &'static str },
    /// The step could not run
    Skipped(EngineError),
}

impl StepOutcome {
    /// Reason string for the completion callback
    pub fn reason(&self) -> &'static str {
        match self {
            StepOutcome::Completed { reason } => reason,
            StepOutcome::Skipped(e) => e.code(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, StepOutcome::Completed { .. })
    }
}

/// A finished step
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepReport {
    pub path: StepPath,
    pub kind: StepKind,
    pub label: Label,
    pub outcome: StepOutcome,
}

/// Rejected interaction surfaced as a warning / haptic cue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Notice {
    pub object: EntityId,
    pub kind: InvalidTransition,
}

/// Engine output, drained by the host
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceEvent {
    /// A step was started
    StepActivated(StepPath),
    /// A step completed or was skipped
    StepFinished(StepReport),
    /// Every step of a group finished
    GroupCompleted(GroupCursor),
    /// The last group finished; no further activation happens
    ProgramCompleted,
    /// The run was stopped before completion
    ProgramAborted,
    /// An interaction was rejected
    Notice(Notice),
}

/// Step counts for host UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Progress {
    pub completed: usize,
    pub skipped: usize,
    pub active: usize,
    pub total: usize,
}

impl Progress {
    /// Completed or skipped
    pub fn finished(&self) -> usize {
        self.completed + self.skipped
    }

    /// Finished share in percent
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.finished() * 100) / self.total).min(100) as u8
    }
}
