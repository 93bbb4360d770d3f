//! Flow restriction
//!
//! Keeps objects the user should not touch yet frozen in place, so that
//! collisions cannot disturb them before their step comes up.

pub mod manager;

pub use manager::{FlowRestriction, FreezeRecord};
