//! Host adapter traits
//!
//! These traits define the interface between the sequence engine and the
//! host application (scene graph, interaction framework, physics engine).
//! One implementation is chosen when a run is configured; the core only
//! ever talks to the traits.

pub mod body;
pub mod entity;
pub mod interaction;

pub use body::{AxisSet, BodyConstraints, BodyControl, SocketQuery};
pub use entity::{AgentId, EntityId, EntityResolver};
pub use interaction::{ConditionSource, GrabSource, InteractionEvent, RotationSource};

/// Everything the engine needs from the host, bundled
///
/// Implemented automatically for any type implementing all adapter traits.
pub trait World:
    EntityResolver + RotationSource + GrabSource + BodyControl + SocketQuery + ConditionSource
{
}

impl<T> World for T where
    T: EntityResolver + RotationSource + GrabSource + BodyControl + SocketQuery + ConditionSource
{
}
