//! Interaction source events and polling adapters

use super::entity::{AgentId, EntityId};
use crate::rotation::Axis;

/// Events emitted by the interaction framework
///
/// The core only consumes these; it never drives the interaction
/// simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InteractionEvent {
    /// An agent took hold of an object
    Grabbed { object: EntityId, agent: AgentId },
    /// An agent let go of an object
    Released { object: EntityId, agent: AgentId },
    /// A socket captured an object
    PlacedInSocket { object: EntityId, socket: EntityId },
    /// An object left a socket
    RemovedFromSocket { object: EntityId, socket: EntityId },
    /// The user tried to pull an object the host is holding in place
    TranslationAttempted { object: EntityId },
    /// An object was pressed / used (buttons, instruction panels)
    Activated { object: EntityId },
    /// An agent arrived at a teleport anchor
    Teleported { agent: AgentId, destination: EntityId },
}

impl InteractionEvent {
    /// The object this event is about, if any
    pub fn object(&self) -> Option<EntityId> {
        match *self {
            InteractionEvent::Grabbed { object, .. }
            | InteractionEvent::Released { object, .. }
            | InteractionEvent::PlacedInSocket { object, .. }
            | InteractionEvent::RemovedFromSocket { object, .. }
            | InteractionEvent::TranslationAttempted { object }
            | InteractionEvent::Activated { object } => Some(object),
            InteractionEvent::Teleported { .. } => None,
        }
    }
}

/// Per-frame orientation sampling
pub trait RotationSource {
    /// Current angle of `object` about `axis`, in degrees
    ///
    /// Any range is accepted; callers normalize. Returns `None` if the
    /// object has no orientation (despawned, not a transform).
    fn angle(&self, object: EntityId, axis: Axis) -> Option<f32>;
}

/// Grip state queries
pub trait GrabSource {
    /// Check if any agent currently holds `object`
    fn is_held(&self, object: EntityId) -> bool;
}

/// External predicates for wait-style steps
pub trait ConditionSource {
    /// Check if the condition attached to `subject` currently holds
    fn is_satisfied(&self, subject: EntityId) -> bool;
}
