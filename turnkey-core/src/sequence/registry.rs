//! Handler registry and dispatch
//!
//! Handlers declare the step kinds they service. Dispatch picks the first
//! registered handler that accepts a kind. One handler instance may track
//! several steps at once (parallel steps); the registry remembers which
//! handler owns which active step and only routes events to handlers that
//! have something active.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::mem;

use super::error::HandlerError;
use super::report::Notice;
use crate::config::{Step, StepKind, StepPath};
use crate::state::InvalidTransition;
use crate::traits::{EntityId, InteractionEvent, World};

/// Resolved references of an active step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Resolved {
    pub target: EntityId,
    pub destination: Option<EntityId>,
}

/// Signals collected from handlers, drained by the engine
#[derive(Debug, Default)]
pub struct Outbox {
    completions: Vec<(StepPath, &'static str)>,
    notices: Vec<Notice>,
}

impl Outbox {
    /// Report that the step at `path` met its completion condition
    pub fn complete(&mut self, path: StepPath, reason: &'static str) {
        if !self.completions.iter().any(|(p, _)| *p == path) {
            self.completions.push((path, reason));
        }
    }

    /// Surface a rejected interaction
    pub fn notify(&mut self, object: EntityId, kind: InvalidTransition) {
        self.notices.push(Notice { object, kind });
    }

    /// Check if anything is waiting to be drained
    pub fn is_empty(&self) -> bool {
        self.completions.is_empty() && self.notices.is_empty()
    }

    fn clear(&mut self) {
        self.completions.clear();
        self.notices.clear();
    }
}

/// What a handler gets to work with during a call
pub struct HandlerContext<'a> {
    pub world: &'a mut dyn World,
    pub outbox: &'a mut Outbox,
}

/// Logic that detects completion of one or more step kinds
///
/// Completion is reported through [`Outbox::complete`], never by calling
/// back into the engine.
pub trait StepHandler {
    /// Name for logs
    fn name(&self) -> &'static str;

    /// Check if this handler services `kind`
    fn can_handle(&self, kind: StepKind) -> bool;

    /// Begin tracking the step at `path`
    ///
    /// May report completion right away if the goal already holds.
    fn start_step(
        &mut self,
        path: StepPath,
        step: &Step,
        resolved: Resolved,
        cx: &mut HandlerContext<'_>,
    ) -> Result<(), HandlerError>;

    /// Stop tracking the step at `path`; no-op if it is not tracked
    fn stop_step(&mut self, path: StepPath, cx: &mut HandlerContext<'_>);

    /// Interaction source event
    fn on_interaction(&mut self, _event: &InteractionEvent, _cx: &mut HandlerContext<'_>) {}

    /// Per-frame polling
    fn tick(&mut self, _cx: &mut HandlerContext<'_>) {}

    /// Drop every tracked step and any per-run state
    fn cleanup(&mut self, cx: &mut HandlerContext<'_>);
}

/// Registered handlers and their active steps
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn StepHandler>>,
    active: BTreeMap<StepPath, usize>,
    outbox: Outbox,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler; earlier registrations win dispatch
    pub fn register(&mut self, handler: Box<dyn StepHandler>) {
        debug!("registered handler {}", handler.name());
        self.handlers.push(handler);
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, handler: Box<dyn StepHandler>) -> Self {
        self.register(handler);
        self
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn position(&self, kind: StepKind) -> Option<usize> {
        self.handlers.iter().position(|h| h.can_handle(kind))
    }

    /// First handler servicing `kind`
    pub fn dispatch(&self, kind: StepKind) -> Option<&dyn StepHandler> {
        self.position(kind).map(|i| self.handlers[i].as_ref())
    }

    /// Check if the step at `path` is started
    pub fn is_active(&self, path: StepPath) -> bool {
        self.active.contains_key(&path)
    }

    /// Paths of every started step
    pub fn active_steps(&self) -> impl Iterator<Item = StepPath> + '_ {
        self.active.keys().copied()
    }

    /// Start the step at `path` on its handler
    ///
    /// A step already started is stopped first so that at most one
    /// handler instance tracks a path.
    pub fn start_step(
        &mut self,
        path: StepPath,
        step: &Step,
        resolved: Resolved,
        world: &mut dyn World,
    ) -> Result<(), HandlerError> {
        self.stop_step(path, world);

        // Engine checks dispatch before activating
        let Some(index) = self.position(step.kind) else {
            return Err(HandlerError::InvalidParameter("kind"));
        };

        let mut cx = HandlerContext {
            world,
            outbox: &mut self.outbox,
        };
        self.handlers[index].start_step(path, step, resolved, &mut cx)?;
        self.active.insert(path, index);
        Ok(())
    }

    /// Stop the step at `path`; no-op if it is not started
    pub fn stop_step(&mut self, path: StepPath, world: &mut dyn World) {
        if let Some(index) = self.active.remove(&path) {
            let mut cx = HandlerContext {
                world,
                outbox: &mut self.outbox,
            };
            self.handlers[index].stop_step(path, &mut cx);
            self.outbox.completions.retain(|(p, _)| *p != path);
        }
    }

    fn busy_handlers(&self) -> Vec<usize> {
        let mut busy: Vec<usize> = self.active.values().copied().collect();
        busy.sort_unstable();
        busy.dedup();
        busy
    }

    /// Forward an interaction event to handlers with active steps
    pub fn route_interaction(&mut self, event: &InteractionEvent, world: &mut dyn World) {
        for index in self.busy_handlers() {
            let mut cx = HandlerContext {
                world: &mut *world,
                outbox: &mut self.outbox,
            };
            self.handlers[index].on_interaction(event, &mut cx);
        }
    }

    /// Poll handlers with active steps
    pub fn tick(&mut self, world: &mut dyn World) {
        for index in self.busy_handlers() {
            let mut cx = HandlerContext {
                world: &mut *world,
                outbox: &mut self.outbox,
            };
            self.handlers[index].tick(&mut cx);
        }
    }

    /// Stop every active step and tear down all handlers
    pub fn cleanup(&mut self, world: &mut dyn World) {
        let paths: Vec<StepPath> = self.active.keys().copied().collect();
        for path in paths {
            self.stop_step(path, &mut *world);
        }
        for handler in self.handlers.iter_mut() {
            let mut cx = HandlerContext {
                world: &mut *world,
                outbox: &mut self.outbox,
            };
            handler.cleanup(&mut cx);
        }
        self.outbox.clear();
    }

    /// Completions reported for steps that are still active
    pub fn take_completions(&mut self) -> Vec<(StepPath, &'static str)> {
        let active = &self.active;
        let mut completions = mem::take(&mut self.outbox.completions);
        completions.retain(|(p, _)| active.contains_key(p));
        completions
    }

    /// Rejected interactions since the last call
    pub fn take_notices(&mut self) -> Vec<Notice> {
        mem::take(&mut self.outbox.notices)
    }
}
