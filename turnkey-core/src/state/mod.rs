//! Rotation lock state machine (valve pattern)
//!
//! Gates what a seated object may do: move freely, only rotate toward
//! tight, or only rotate back toward loose. The state machine is explicit,
//! finite and deterministic; `RotationLock` adds the rotation tracking and
//! socket bookkeeping around it.

pub mod events;
pub mod lock;
pub mod machine;

pub use events::LockEvent;
pub use lock::{InvalidTransition, LockConfig, LockSignal, RotationLock};
pub use machine::LockState;
