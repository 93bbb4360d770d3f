//! Instruction and teleport steps

use alloc::collections::BTreeMap;

use turnkey_core::config::{Step, StepKind, StepPath};
use turnkey_core::sequence::{HandlerContext, HandlerError, Resolved, StepHandler};
use turnkey_core::traits::{EntityId, InteractionEvent};

#[derive(Debug, Clone, Copy)]
enum Awaiting {
    /// Instruction panel pressed
    Activation(EntityId),
    /// Agent arrived at the anchor
    Arrival(EntityId),
}

/// Handler for show-instruction and teleport steps
///
/// An instruction completes when its target is activated (the user
/// acknowledged it), a teleport when any agent arrives at the destination
/// anchor.
#[derive(Debug, Default)]
pub struct InstructionHandler {
    tracked: BTreeMap<StepPath, Awaiting>,
}

impl InstructionHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StepHandler for InstructionHandler {
    fn name(&self) -> &'static str {
        "instruction"
    }

    fn can_handle(&self, kind: StepKind) -> bool {
        matches!(kind, StepKind::ShowInstruction | StepKind::Teleport)
    }

    fn start_step(
        &mut self,
        path: StepPath,
        step: &Step,
        resolved: Resolved,
        _cx: &mut HandlerContext<'_>,
    ) -> Result<(), HandlerError> {
        if step.kind.needs_destination() && resolved.destination.is_none() {
            return Err(HandlerError::MissingDestination);
        }
        let awaiting = match (step.kind, resolved.destination) {
            (StepKind::ShowInstruction, _) => Awaiting::Activation(resolved.target),
            (StepKind::Teleport, Some(anchor)) => Awaiting::Arrival(anchor),
            _ => return Err(HandlerError::InvalidParameter("kind")),
        };
        self.tracked.insert(path, awaiting);
        Ok(())
    }

    fn stop_step(&mut self, path: StepPath, _cx: &mut HandlerContext<'_>) {
        self.tracked.remove(&path);
    }

    fn on_interaction(&mut self, event: &InteractionEvent, cx: &mut HandlerContext<'_>) {
        for (path, awaiting) in &self.tracked {
            let reason = match (*awaiting, *event) {
                (Awaiting::Activation(target), InteractionEvent::Activated { object })
                    if target == object =>
                {
                    "acknowledged"
                }
                (Awaiting::Arrival(anchor), InteractionEvent::Teleported { destination, .. })
                    if anchor == destination =>
                {
                    "arrived"
                }
                _ => continue,
            };
            cx.outbox.complete(*path, reason);
        }
    }

    fn cleanup(&mut self, _cx: &mut HandlerContext<'_>) {
        self.tracked.clear();
    }
}
