//! Wait-for-condition steps

use alloc::collections::BTreeMap;

use turnkey_core::config::{Step, StepKind, StepPath};
use turnkey_core::sequence::{HandlerContext, HandlerError, Resolved, StepHandler};
use turnkey_core::traits::EntityId;

/// Polls the host's condition for the target once per tick
///
/// There is no timeout; stopping the step is the only way to cancel.
#[derive(Debug, Default)]
pub struct ConditionHandler {
    tracked: BTreeMap<StepPath, EntityId>,
}

impl ConditionHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StepHandler for ConditionHandler {
    fn name(&self) -> &'static str {
        "condition"
    }

    fn can_handle(&self, kind: StepKind) -> bool {
        kind == StepKind::WaitForCondition
    }

    fn start_step(
        &mut self,
        path: StepPath,
        _step: &Step,
        resolved: Resolved,
        _cx: &mut HandlerContext<'_>,
    ) -> Result<(), HandlerError> {
        self.tracked.insert(path, resolved.target);
        Ok(())
    }

    fn stop_step(&mut self, path: StepPath, _cx: &mut HandlerContext<'_>) {
        self.tracked.remove(&path);
    }

    fn tick(&mut self, cx: &mut HandlerContext<'_>) {
        for (path, subject) in &self.tracked {
            if cx.world.is_satisfied(*subject) {
                cx.outbox.complete(*path, "condition-met");
            }
        }
    }

    fn cleanup(&mut self, _cx: &mut HandlerContext<'_>) {
        self.tracked.clear();
    }
}
