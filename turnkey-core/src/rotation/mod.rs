//! Rotation tracking
//!
//! Angle math shared by the valve lock and the knob trackers: wraparound
//! correction, direction filtering and threshold checks.

pub mod accumulator;
pub mod angle;
pub mod knob;

pub use accumulator::RotationAccumulator;
pub use angle::{
    abs_deg, shortest_arc, signed_delta, wrap_degrees, Axis, Direction, FULL_TURN_DEG,
    HALF_TURN_DEG,
};
pub use knob::{AngleTarget, TurnCounter};
