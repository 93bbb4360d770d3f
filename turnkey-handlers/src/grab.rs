//! Grab steps

use alloc::collections::BTreeMap;

use turnkey_core::config::{Step, StepKind, StepPath};
use turnkey_core::sequence::{HandlerContext, HandlerError, Resolved, StepHandler};
use turnkey_core::traits::{EntityId, InteractionEvent};

/// Completes when the target is grabbed
///
/// A target already held at step start completes right away.
#[derive(Debug, Default)]
pub struct GrabHandler {
    tracked: BTreeMap<StepPath, EntityId>,
}

impl GrabHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StepHandler for GrabHandler {
    fn name(&self) -> &'static str {
        "grab"
    }

    fn can_handle(&self, kind: StepKind) -> bool {
        kind == StepKind::Grab
    }

    fn start_step(
        &mut self,
        path: StepPath,
        _step: &Step,
        resolved: Resolved,
        cx: &mut HandlerContext<'_>,
    ) -> Result<(), HandlerError> {
        self.tracked.insert(path, resolved.target);
        if cx.world.is_held(resolved.target) {
            cx.outbox.complete(path, "grabbed");
        }
        Ok(())
    }

    fn stop_step(&mut self, path: StepPath, _cx: &mut HandlerContext<'_>) {
        self.tracked.remove(&path);
    }

    fn on_interaction(&mut self, event: &InteractionEvent, cx: &mut HandlerContext<'_>) {
        if let InteractionEvent::Grabbed { object, .. } = *event {
            for (path, target) in &self.tracked {
                if *target == object {
                    cx.outbox.complete(*path, "grabbed");
                }
            }
        }
    }

    fn cleanup(&mut self, _cx: &mut HandlerContext<'_>) {
        self.tracked.clear();
    }
}
