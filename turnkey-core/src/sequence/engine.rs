//! Sequence engine
//!
//! Walks modules, task groups and steps in order. Within a sequential group
//! only one non-parallel step is active at a time; parallel steps run next
//! to it for the whole group. Unordered groups start every step at once.
//!
//! The engine never blocks. Hosts drive it with [`SequenceEngine::tick`]
//! once per frame and [`SequenceEngine::handle_interaction`] for every
//! interaction source event; completion signals collected from handlers are
//! settled before either call returns.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::mem;

use super::error::{EngineError, ReferenceField};
use super::observer::SequenceObserver;
use super::registry::{HandlerRegistry, Resolved};
use super::report::{Progress, SequenceEvent, StepOutcome, StepReport};
use crate::config::types::indexed;
use crate::config::{GroupCursor, Program, StepPath, TaskGroup};
use crate::traits::{InteractionEvent, World};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Reason reported for steps force-completed by [`SequenceEngine::advance`]
pub const ADVANCED: &str = "advanced";

/// Engine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EnginePhase {
    /// No program, or the last one was aborted
    #[default]
    Idle,
    /// Walking a program
    Running,
    /// Last group finished
    Complete,
}

/// Host collaborators for one engine call
pub struct RunContext<'a> {
    pub world: &'a mut dyn World,
    pub observer: &'a mut dyn SequenceObserver,
}

impl<'a> RunContext<'a> {
    pub fn new(world: &'a mut dyn World, observer: &'a mut dyn SequenceObserver) -> Self {
        Self { world, observer }
    }
}

/// Hierarchical step orchestrator
pub struct SequenceEngine {
    phase: EnginePhase,
    program: Program,
    group: Option<GroupCursor>,
    active: BTreeMap<StepPath, Resolved>,
    registry: HandlerRegistry,
    events: Vec<SequenceEvent>,
}

impl SequenceEngine {
    /// Create an idle engine dispatching to `registry`
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            phase: EnginePhase::Idle,
            program: Program::default(),
            group: None,
            active: BTreeMap::new(),
            registry,
            events: Vec::new(),
        }
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Program of the current (or last) run
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Group currently being worked on
    pub fn current_group(&self) -> Option<GroupCursor> {
        self.group
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Check if the step at `path` is active
    pub fn is_active(&self, path: StepPath) -> bool {
        self.active.contains_key(&path)
    }

    /// Active steps with their resolved references
    pub fn active_steps(&self) -> impl Iterator<Item = (StepPath, Resolved)> + '_ {
        self.active.iter().map(|(p, r)| (*p, *r))
    }

    /// Step counts for the current run
    pub fn progress(&self) -> Progress {
        let mut progress = Progress {
            active: self.active.len(),
            ..Progress::default()
        };
        for (_, step) in self.program.steps() {
            progress.total += 1;
            if step.is_completed {
                progress.completed += 1;
            } else if step.skipped {
                progress.skipped += 1;
            }
        }
        progress
    }

    /// Take every event emitted since the last call
    pub fn drain_events(&mut self) -> Vec<SequenceEvent> {
        mem::take(&mut self.events)
    }

    /// Start walking `program`
    pub fn start(&mut self, program: Program, cx: &mut RunContext<'_>) -> Result<(), EngineError> {
        if self.phase == EnginePhase::Running {
            return Err(EngineError::AlreadyRunning);
        }

        self.program = program;
        self.program.reset_progress();
        self.active.clear();
        self.group = None;
        self.phase = EnginePhase::Running;
        info!(
            "program {} started, {} steps",
            self.program.label.as_str(),
            self.program.total_steps()
        );

        cx.observer.program_started(&self.program, cx.world);
        match self.program.first_group() {
            Some(group) => self.enter_group(group, cx),
            None => self.finish_program(cx),
        }
        self.settle(cx);
        Ok(())
    }

    /// Force-complete the step(s) gating the current group
    ///
    /// In a sequential group that is the active non-parallel step, or every
    /// active parallel step once no non-parallel step is left. In an
    /// unordered group it is every active step.
    pub fn advance(&mut self, cx: &mut RunContext<'_>) -> Result<(), EngineError> {
        let cursor = self.running_group()?;
        let sequential = self
            .program
            .group(cursor)
            .is_some_and(|g| g.enforce_sequential_flow);

        let in_group: Vec<StepPath> = self
            .active
            .keys()
            .copied()
            .filter(|p| p.group_cursor() == cursor)
            .collect();
        let gating: Vec<StepPath> = if sequential {
            let blocking: Vec<StepPath> = in_group
                .iter()
                .copied()
                .filter(|p| self.program.step(*p).is_some_and(|s| !s.allow_parallel))
                .collect();
            if blocking.is_empty() {
                in_group
            } else {
                blocking
            }
        } else {
            in_group
        };

        debug!("advance: forcing {} step(s)", gating.len());
        for path in gating {
            self.finish(path, StepOutcome::Completed { reason: ADVANCED }, cx);
        }
        self.settle(cx);
        Ok(())
    }

    /// Complete an active step from outside the handlers
    pub fn complete_step(
        &mut self,
        path: StepPath,
        reason: &'static str,
        cx: &mut RunContext<'_>,
    ) -> Result<(), EngineError> {
        self.running_group()?;
        if !self.active.contains_key(&path) {
            return Err(EngineError::UnknownStep);
        }
        self.finish(path, StepOutcome::Completed { reason }, cx);
        self.settle(cx);
        Ok(())
    }

    /// Per-frame update
    pub fn tick(&mut self, cx: &mut RunContext<'_>) {
        if self.phase != EnginePhase::Running {
            return;
        }
        self.registry.tick(cx.world);
        self.settle(cx);
    }

    /// Route an interaction source event to the active handlers
    pub fn handle_interaction(&mut self, event: &InteractionEvent, cx: &mut RunContext<'_>) {
        if self.phase != EnginePhase::Running {
            return;
        }
        trace!("interaction {:?}", event);
        self.registry.route_interaction(event, cx.world);
        self.settle(cx);
    }

    /// Stop the run, tearing down every active step
    pub fn abort(&mut self, cx: &mut RunContext<'_>) -> Result<(), EngineError> {
        self.running_group()?;
        let paths: Vec<StepPath> = self.active.keys().copied().collect();
        for path in paths {
            self.registry.stop_step(path, cx.world);
        }
        self.active.clear();
        self.registry.cleanup(cx.world);
        self.group = None;
        self.phase = EnginePhase::Idle;
        info!("program {} aborted", self.program.label.as_str());
        self.events.push(SequenceEvent::ProgramAborted);
        cx.observer.program_aborted(&self.program, cx.world);
        Ok(())
    }

    fn running_group(&self) -> Result<GroupCursor, EngineError> {
        match (self.phase, self.group) {
            (EnginePhase::Running, Some(group)) => Ok(group),
            _ => Err(EngineError::NotRunning),
        }
    }

    /// Drain handler signals and activate newly eligible steps until stable
    fn settle(&mut self, cx: &mut RunContext<'_>) {
        loop {
            for notice in self.registry.take_notices() {
                self.events.push(SequenceEvent::Notice(notice));
            }

            let mut changed = false;
            for (path, reason) in self.registry.take_completions() {
                changed |= self.finish(path, StepOutcome::Completed { reason }, cx);
            }

            if self.phase != EnginePhase::Running {
                break;
            }
            let Some(group) = self.group else {
                break;
            };

            if self.program.group(group).map_or(true, TaskGroup::is_finished) {
                self.leave_group(group, cx);
                continue;
            }

            let eligible = self.eligible(group);
            if eligible.is_empty() && !changed {
                break;
            }
            for path in eligible {
                self.activate(path, cx);
            }
        }
    }

    /// Steps in `cursor` that may start now
    fn eligible(&self, cursor: GroupCursor) -> Vec<StepPath> {
        let Some(group) = self.program.group(cursor) else {
            return Vec::new();
        };
        let pending = indexed(&group.steps)
            .map(|(i, step)| (cursor.step(i), step))
            .filter(|(path, step)| !step.is_finished() && !self.active.contains_key(path));

        if !group.enforce_sequential_flow {
            return pending.map(|(path, _)| path).collect();
        }

        let mut eligible: Vec<StepPath> = pending
            .filter(|(_, step)| step.allow_parallel)
            .map(|(path, _)| path)
            .collect();

        // First unfinished non-parallel step gates the rest
        let gate = indexed(&group.steps)
            .find(|(_, s)| !s.allow_parallel && !s.is_finished())
            .map(|(i, _)| cursor.step(i));
        if let Some(path) = gate.filter(|p| !self.active.contains_key(p)) {
            eligible.push(path);
        }
        eligible.sort_unstable();
        eligible
    }

    fn resolve(&mut self, path: StepPath, world: &dyn World) -> Result<Resolved, EngineError> {
        let step = self.program.step_mut(path).ok_or(EngineError::UnknownStep)?;
        let target = step
            .target
            .resolve_cached(world)
            .ok_or(EngineError::UnresolvedReference {
                field: ReferenceField::Target,
            })?;
        let destination = match step.destination.as_mut() {
            Some(reference) => Some(reference.resolve_cached(world).ok_or(
                EngineError::UnresolvedReference {
                    field: ReferenceField::Destination,
                },
            )?),
            None => None,
        };
        Ok(Resolved {
            target,
            destination,
        })
    }

    fn activate(&mut self, path: StepPath, cx: &mut RunContext<'_>) {
        let resolved = match self.resolve(path, &*cx.world) {
            Ok(resolved) => resolved,
            Err(e) => {
                self.skip(path, e);
                return;
            }
        };
        let Some(kind) = self.program.step(path).map(|s| s.kind) else {
            return;
        };
        if self.registry.dispatch(kind).is_none() {
            self.skip(path, EngineError::NoHandlerForStepKind(kind));
            return;
        }

        self.active.insert(path, resolved);
        info!("step {:?} activated ({})", path, kind.name());
        self.events.push(SequenceEvent::StepActivated(path));
        cx.observer
            .step_activated(&self.program, path, resolved, cx.world);

        let Some(step) = self.program.step(path) else {
            return;
        };
        if let Err(e) = self.registry.start_step(path, step, resolved, cx.world) {
            error!("step {:?} rejected by handler: {}", path, e);
            self.finish(
                path,
                StepOutcome::Skipped(EngineError::HandlerRejected(e)),
                cx,
            );
        }
    }

    /// Skip a step that never became active
    fn skip(&mut self, path: StepPath, error: EngineError) {
        if error.is_config_defect() {
            error!("step {:?} skipped: {}", path, error);
        } else {
            warn!("step {:?} skipped: {}", path, error);
        }
        if let Some(step) = self.program.step_mut(path) {
            step.skipped = true;
        }
        self.report(path, StepOutcome::Skipped(error));
    }

    /// Stop an active step and record its outcome
    ///
    /// Returns `false` if the step was not active.
    fn finish(&mut self, path: StepPath, outcome: StepOutcome, cx: &mut RunContext<'_>) -> bool {
        let Some(resolved) = self.active.remove(&path) else {
            return false;
        };
        self.registry.stop_step(path, cx.world);

        if let Some(step) = self.program.step_mut(path) {
            match outcome {
                StepOutcome::Completed { .. } => step.is_completed = true,
                StepOutcome::Skipped(_) => step.skipped = true,
            }
        }
        match outcome {
            StepOutcome::Completed { reason } => info!("step {:?} completed ({})", path, reason),
            StepOutcome::Skipped(e) => warn!("step {:?} skipped: {}", path, e),
        }

        self.report(path, outcome);
        cx.observer
            .step_completed(&self.program, path, resolved.target, cx.world);
        true
    }

    fn report(&mut self, path: StepPath, outcome: StepOutcome) {
        if let Some(step) = self.program.step(path) {
            self.events.push(SequenceEvent::StepFinished(StepReport {
                path,
                kind: step.kind,
                label: step.label.clone(),
                outcome,
            }));
        }
    }

    fn enter_group(&mut self, group: GroupCursor, cx: &mut RunContext<'_>) {
        debug!("entering group {:?}", group);
        self.group = Some(group);
        cx.observer.group_entered(&self.program, group, cx.world);
    }

    fn leave_group(&mut self, group: GroupCursor, cx: &mut RunContext<'_>) {
        info!("group {:?} completed", group);
        self.events.push(SequenceEvent::GroupCompleted(group));
        cx.observer.group_completed(&self.program, group, cx.world);
        match self.program.next_group(group) {
            Some(next) => self.enter_group(next, cx),
            None => self.finish_program(cx),
        }
    }

    fn finish_program(&mut self, cx: &mut RunContext<'_>) {
        self.registry.cleanup(cx.world);
        self.group = None;
        self.phase = EnginePhase::Complete;
        info!("program {} completed", self.program.label.as_str());
        self.events.push(SequenceEvent::ProgramCompleted);
        cx.observer.program_completed(&self.program, cx.world);
    }
}
