//! Angle math
//!
//! All angles are in degrees. Sampled orientations may be in any range;
//! deltas between samples are normalized to (-180, 180] so a 359° → 0°
//! step reads as +1°, not -359°.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One full turn in degrees
pub const FULL_TURN_DEG: f32 = 360.0;

/// Half a turn in degrees
pub const HALF_TURN_DEG: f32 = 180.0;

/// Rotation axis, in the object's local frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    X,
    #[default]
    Y,
    Z,
}

/// Rotation direction about an axis
///
/// A positive angle delta about the configured axis counts as clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Clockwise rotation (positive delta)
    #[default]
    Clockwise,
    /// Counter-clockwise rotation (negative delta)
    CounterClockwise,
}

impl Direction {
    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }

    /// Sign applied to a raw delta to measure progress in this direction
    pub fn sign(self) -> f32 {
        match self {
            Direction::Clockwise => 1.0,
            Direction::CounterClockwise => -1.0,
        }
    }

    /// Direction of a signed delta, `None` for no movement
    pub fn of(delta: f32) -> Option<Self> {
        if delta > 0.0 {
            Some(Direction::Clockwise)
        } else if delta < 0.0 {
            Some(Direction::CounterClockwise)
        } else {
            None
        }
    }
}

/// Absolute value without relying on std float intrinsics
pub fn abs_deg(value: f32) -> f32 {
    if value < 0.0 {
        -value
    } else {
        value
    }
}

/// Wrap an angle into [0, 360)
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle % FULL_TURN_DEG;
    if wrapped < 0.0 {
        wrapped + FULL_TURN_DEG
    } else {
        wrapped
    }
}

/// Normalize a raw delta into (-180, 180]
pub fn normalize_delta(delta: f32) -> f32 {
    let mut d = delta % FULL_TURN_DEG;
    if d > HALF_TURN_DEG {
        d -= FULL_TURN_DEG;
    } else if d <= -HALF_TURN_DEG {
        d += FULL_TURN_DEG;
    }
    d
}

/// Signed rotation from `from` to `to`, in (-180, 180]
pub fn signed_delta(from: f32, to: f32) -> f32 {
    normalize_delta(to - from)
}

/// Unsigned shortest-arc distance between two angles, in [0, 180]
pub fn shortest_arc(a: f32, b: f32) -> f32 {
    abs_deg(signed_delta(a, b))
}
