//! Sequence orchestration
//!
//! Walks the program hierarchy, dispatches each step to a handler and
//! advances on completion signals. Nothing below unwinds past the engine:
//! step-level failures become skipped-step reports and the run continues.

pub mod engine;
pub mod error;
pub mod observer;
pub mod registry;
pub mod report;

pub use engine::{EnginePhase, RunContext, SequenceEngine};
pub use error::{EngineError, HandlerError, ReferenceField};
pub use observer::SequenceObserver;
pub use registry::{HandlerContext, HandlerRegistry, Outbox, Resolved, StepHandler};
pub use report::{Notice, Progress, SequenceEvent, StepOutcome, StepReport};
