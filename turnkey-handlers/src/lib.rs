//! Step handler implementations
//!
//! This crate provides the concrete [`StepHandler`]s for every step kind
//! defined in turnkey-core:
//!
//! - Valve steps (install, tighten, loosen, remove) over the rotation lock
//! - Knob and turn-by-count steps
//! - Grab and grab-and-snap steps
//! - Instruction, teleport and wait-for-condition steps
//!
//! [`StepHandler`]: turnkey_core::sequence::StepHandler

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod condition;
pub mod grab;
pub mod instruction;
pub mod knob;
pub mod snap;
pub mod valve;

#[cfg(test)]
mod testing;

use alloc::boxed::Box;

use turnkey_core::config::ProfileSet;
use turnkey_core::sequence::HandlerRegistry;

pub use condition::ConditionHandler;
pub use grab::GrabHandler;
pub use instruction::InstructionHandler;
pub use knob::KnobHandler;
pub use snap::SnapHandler;
pub use valve::ValveHandler;

/// Registry with one handler per step kind
///
/// Every [`StepKind`](turnkey_core::config::StepKind) dispatches to
/// exactly one of these.
pub fn default_registry(profiles: &ProfileSet) -> HandlerRegistry {
    HandlerRegistry::new()
        .with(Box::new(ValveHandler::new(profiles.clone())))
        .with(Box::new(KnobHandler::new(profiles.clone())))
        .with(Box::new(SnapHandler::new()))
        .with(Box::new(GrabHandler::new()))
        .with(Box::new(InstructionHandler::new()))
        .with(Box::new(ConditionHandler::new()))
}
