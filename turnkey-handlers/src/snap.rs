//! Grab-and-snap steps

use alloc::collections::BTreeMap;

use turnkey_core::config::{Step, StepKind, StepPath};
use turnkey_core::sequence::{HandlerContext, HandlerError, Resolved, StepHandler};
use turnkey_core::state::InvalidTransition;
use turnkey_core::traits::InteractionEvent;

/// Completes when the target lands in the destination socket
///
/// Without a destination any socket will do. Placement into the wrong
/// socket is reported as a notice and does not complete the step.
#[derive(Debug, Default)]
pub struct SnapHandler {
    tracked: BTreeMap<StepPath, Resolved>,
}

impl SnapHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StepHandler for SnapHandler {
    fn name(&self) -> &'static str {
        "snap"
    }

    fn can_handle(&self, kind: StepKind) -> bool {
        kind == StepKind::GrabAndSnap
    }

    fn start_step(
        &mut self,
        path: StepPath,
        _step: &Step,
        resolved: Resolved,
        _cx: &mut HandlerContext<'_>,
    ) -> Result<(), HandlerError> {
        self.tracked.insert(path, resolved);
        Ok(())
    }

    fn stop_step(&mut self, path: StepPath, _cx: &mut HandlerContext<'_>) {
        self.tracked.remove(&path);
    }

    fn on_interaction(&mut self, event: &InteractionEvent, cx: &mut HandlerContext<'_>) {
        let InteractionEvent::PlacedInSocket { object, socket } = *event else {
            return;
        };
        for (path, resolved) in &self.tracked {
            if resolved.target != object {
                continue;
            }
            match resolved.destination {
                Some(expected) if expected != socket => {
                    warn!("{:?} placed in {:?}, expected {:?}", object, socket, expected);
                    cx.outbox.notify(object, InvalidTransition::IncompatibleSocket);
                }
                _ => cx.outbox.complete(*path, "snapped"),
            }
        }
    }

    fn cleanup(&mut self, _cx: &mut HandlerContext<'_>) {
        self.tracked.clear();
    }
}
