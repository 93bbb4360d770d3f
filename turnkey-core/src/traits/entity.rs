//! Entity handles and resolution

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque handle to a live scene object, issued by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityId(pub u32);

/// Handle to an interacting agent (a hand, a controller, a tool)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AgentId(pub u32);

/// Entity resolution service
///
/// The core calls this once per access and never scans the scene itself.
pub trait EntityResolver {
    /// Check whether a previously issued handle still refers to a live object
    fn is_live(&self, id: EntityId) -> bool;

    /// Find a live object by its lookup key (name or path)
    fn lookup(&self, key: &str) -> Option<EntityId>;

    /// True while the host is in design-time editing
    ///
    /// Resolved handles are not cached in this mode since the scene may
    /// still be rearranged.
    fn is_design_time(&self) -> bool {
        false
    }
}
