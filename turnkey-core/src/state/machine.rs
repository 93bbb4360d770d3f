//! Lock state definition
//!
//! Translation and rotation capability of a seated object is a function of
//! the current state.

use super::events::LockEvent;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lock states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LockState {
    /// Free to move and rotate
    #[default]
    Unlocked,
    /// Seated; may only rotate about the lock axis, tightening
    LockedLoose,
    /// Seated and tight; may only rotate about the lock axis, loosening
    LockedTight,
}

impl LockState {
    /// Check if the object may translate
    pub fn allows_translation(&self) -> bool {
        matches!(self, LockState::Unlocked)
    }

    /// Check if the object is held by its socket
    pub fn is_locked(&self) -> bool {
        !self.allows_translation()
    }

    /// Check if rotation is tracked in this state
    pub fn tracks_rotation(&self) -> bool {
        self.is_locked()
    }

    /// Process an event and return the next state
    ///
    /// `LoosenReached` does not change state: the object stays tight until
    /// the grip is released.
    pub fn transition(self, event: LockEvent) -> Self {
        use LockEvent::*;
        use LockState::*;

        match (self, event) {
            (Unlocked, SocketAccepted) => LockedLoose,
            (LockedLoose, TightenReached) => LockedTight,
            (LockedTight, GripReleased) => Unlocked,

            // Default: stay in current state
            _ => self,
        }
    }
}
