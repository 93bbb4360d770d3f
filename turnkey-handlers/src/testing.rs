//! Test rig: a registry over a mock world

use alloc::boxed::Box;
use alloc::vec::Vec;

use turnkey_core::config::{Step, StepPath};
use turnkey_core::mock::MockWorld;
use turnkey_core::sequence::{HandlerError, HandlerRegistry, Notice, Resolved, StepHandler};
use turnkey_core::traits::InteractionEvent;

pub struct Rig {
    pub world: MockWorld,
    pub registry: HandlerRegistry,
}

impl Rig {
    pub fn new(handler: Box<dyn StepHandler>) -> Self {
        Self {
            world: MockWorld::new(),
            registry: HandlerRegistry::new().with(handler),
        }
    }

    pub fn start(&mut self, path: StepPath, step: &Step) -> Result<(), HandlerError> {
        let resolved = Resolved {
            target: step.target.resolve(&self.world).ok_or(HandlerError::NoOrientation)?,
            destination: step.destination.as_ref().and_then(|d| d.resolve(&self.world)),
        };
        self.registry.start_step(path, step, resolved, &mut self.world)
    }

    pub fn stop(&mut self, path: StepPath) {
        self.registry.stop_step(path, &mut self.world);
    }

    pub fn event(&mut self, event: InteractionEvent) {
        self.registry.route_interaction(&event, &mut self.world);
    }

    pub fn tick(&mut self) {
        self.registry.tick(&mut self.world);
    }

    pub fn cleanup(&mut self) {
        self.registry.cleanup(&mut self.world);
    }

    pub fn completions(&mut self) -> Vec<(StepPath, &'static str)> {
        self.registry.take_completions()
    }

    pub fn notices(&mut self) -> Vec<Notice> {
        self.registry.take_notices()
    }
}
