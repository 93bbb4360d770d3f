//! Physics body and socket adapters
//!
//! The core never simulates physics. It only toggles constraint flags on
//! bodies owned by the host's simulator and switches socket capture on
//! and off.

use super::entity::EntityId;
use crate::rotation::Axis;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Set of axes, used for position and rotation locks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisSet(u8);

impl AxisSet {
    /// No axis
    pub const NONE: Self = Self(0);
    /// All three axes
    pub const ALL: Self = Self(0b111);

    const fn bit(axis: Axis) -> u8 {
        match axis {
            Axis::X => 0b001,
            Axis::Y => 0b010,
            Axis::Z => 0b100,
        }
    }

    /// Set containing a single axis
    pub const fn only(axis: Axis) -> Self {
        Self(Self::bit(axis))
    }

    /// Add an axis
    pub const fn with(self, axis: Axis) -> Self {
        Self(self.0 | Self::bit(axis))
    }

    /// Remove an axis
    pub const fn without(self, axis: Axis) -> Self {
        Self(self.0 & !Self::bit(axis))
    }

    /// Check membership
    pub const fn contains(self, axis: Axis) -> bool {
        self.0 & Self::bit(axis) != 0
    }

    /// Check if the set is empty
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Motion constraints applied to a physics body
///
/// An axis in `position` cannot translate; an axis in `rotation` cannot
/// rotate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyConstraints {
    /// Frozen translation axes
    pub position: AxisSet,
    /// Frozen rotation axes
    pub rotation: AxisSet,
}

impl BodyConstraints {
    /// Unconstrained body
    pub const FREE: Self = Self {
        position: AxisSet::NONE,
        rotation: AxisSet::NONE,
    };

    /// Fully frozen body (no translation, no rotation)
    pub const FROZEN: Self = Self {
        position: AxisSet::ALL,
        rotation: AxisSet::ALL,
    };

    /// Position frozen, rotation allowed about `axis` only
    pub const fn rotate_only(axis: Axis) -> Self {
        Self {
            position: AxisSet::ALL,
            rotation: AxisSet::ALL.without(axis),
        }
    }

    /// Check if no motion at all is possible
    pub fn is_frozen(&self) -> bool {
        *self == Self::FROZEN
    }
}

/// Physics body control
pub trait BodyControl {
    /// Check if `object` carries a physics body the engine may constrain
    fn is_trackable(&self, object: EntityId) -> bool;

    /// Check if `object` is already held by a rotation joint
    fn has_rotation_joint(&self, object: EntityId) -> bool;

    /// Current constraints of `object`, or `None` if it has no body
    fn constraints(&self, object: EntityId) -> Option<BodyConstraints>;

    /// Replace the constraints of `object`
    fn set_constraints(&mut self, object: EntityId, constraints: BodyConstraints);
}

/// Socket queries and capture control
pub trait SocketQuery {
    /// Check if `object` is a socket (a fixed anchor that captures objects)
    fn is_socket(&self, object: EntityId) -> bool;

    /// Check if `socket` carries `tag`
    fn has_tag(&self, socket: EntityId, tag: &str) -> bool;

    /// Enable or disable capture on `socket`
    ///
    /// While capture is disabled the socket will neither grab new objects
    /// nor let its current occupant be pulled out by the interaction layer.
    fn set_socket_capture(&mut self, socket: EntityId, enabled: bool);
}
