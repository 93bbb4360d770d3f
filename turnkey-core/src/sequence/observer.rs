//! Engine lifecycle hooks
//!
//! Activation is announced before the handler's `start_step`, completion
//! after its `stop_step`, so an observer and a handler never own an object
//! at the same time.

use super::registry::Resolved;
use crate::config::{GroupCursor, Program, StepPath};
use crate::traits::{EntityId, World};

/// Observer of the engine's walk through a program
#[allow(unused_variables)]
pub trait SequenceObserver {
    /// Program accepted, before the first group is entered
    fn program_started(&mut self, program: &Program, world: &mut dyn World) {}

    /// A group became current
    fn group_entered(&mut self, program: &Program, group: GroupCursor, world: &mut dyn World) {}

    /// A step is about to be started
    fn step_activated(
        &mut self,
        program: &Program,
        path: StepPath,
        resolved: Resolved,
        world: &mut dyn World,
    ) {
    }

    /// A started step was stopped; `target` is the object it acted on
    fn step_completed(
        &mut self,
        program: &Program,
        path: StepPath,
        target: EntityId,
        world: &mut dyn World,
    ) {
    }

    /// Every step of a group finished
    fn group_completed(&mut self, program: &Program, group: GroupCursor, world: &mut dyn World) {}

    /// The last group finished
    fn program_completed(&mut self, program: &Program, world: &mut dyn World) {}

    /// The run was stopped before completion
    fn program_aborted(&mut self, program: &Program, world: &mut dyn World) {
        self.program_completed(program, world);
    }
}

/// No observer
impl SequenceObserver for () {}
