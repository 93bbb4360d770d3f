//! Engine and handler errors

use core::fmt;

use crate::config::StepKind;

/// Which reference of a step failed to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReferenceField {
    Target,
    Destination,
}

/// Reasons a handler refuses to start a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandlerError {
    /// A parameter the step kind needs is not set
    MissingParameter(&'static str),
    /// A parameter is out of range
    InvalidParameter(&'static str),
    /// The target has no orientation to sample
    NoOrientation,
    /// The step kind needs a destination and none was given
    MissingDestination,
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::MissingParameter(name) => write!(f, "missing parameter `{}`", name),
            HandlerError::InvalidParameter(name) => write!(f, "invalid parameter `{}`", name),
            HandlerError::NoOrientation => f.write_str("target has no orientation"),
            HandlerError::MissingDestination => f.write_str("missing destination"),
        }
    }
}

/// Engine errors
///
/// Step-level variants never abort a run; they end up in a skipped-step
/// report. The rest are returned from engine calls made in the wrong phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineError {
    /// An entity reference did not resolve at step start
    UnresolvedReference { field: ReferenceField },
    /// No registered handler services the step kind
    NoHandlerForStepKind(StepKind),
    /// The handler refused to start the step
    HandlerRejected(HandlerError),
    /// A program is already running
    AlreadyRunning,
    /// No program is running
    NotRunning,
    /// The step is not active
    UnknownStep,
}

impl EngineError {
    /// Short machine-readable code, used as the completion reason
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::UnresolvedReference { .. } => "unresolved-reference",
            EngineError::NoHandlerForStepKind(_) => "no-handler",
            EngineError::HandlerRejected(_) => "handler-rejected",
            EngineError::AlreadyRunning => "already-running",
            EngineError::NotRunning => "not-running",
            EngineError::UnknownStep => "unknown-step",
        }
    }

    /// Check if the error indicates a configuration defect rather than a
    /// runtime race
    pub fn is_config_defect(&self) -> bool {
        matches!(
            self,
            EngineError::NoHandlerForStepKind(_) | EngineError::HandlerRejected(_)
        )
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::UnresolvedReference { field } => match field {
                ReferenceField::Target => f.write_str("target reference did not resolve"),
                ReferenceField::Destination => {
                    f.write_str("destination reference did not resolve")
                }
            },
            EngineError::NoHandlerForStepKind(kind) => {
                write!(f, "no handler for step kind {}", kind.name())
            }
            EngineError::HandlerRejected(e) => write!(f, "handler rejected step: {}", e),
            EngineError::AlreadyRunning => f.write_str("a program is already running"),
            EngineError::NotRunning => f.write_str("no program is running"),
            EngineError::UnknownStep => f.write_str("step is not active"),
        }
    }
}
