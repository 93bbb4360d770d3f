//! Engine-agnostic core logic for the training sequence engine
//!
//! This crate contains all logic that does not depend on a specific
//! interaction framework or physics engine:
//!
//! - Adapter traits for the host (entity resolution, interaction, bodies)
//! - Program model (program → module → task group → step)
//! - Rotation math and the knob / turn-count trackers
//! - Rotation lock state machine (valve pattern)
//! - Handler registry and sequence engine
//! - Flow restriction (freeze / unfreeze with lookahead)

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod config;
pub mod restriction;
pub mod rotation;
pub mod sequence;
pub mod state;
pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;
