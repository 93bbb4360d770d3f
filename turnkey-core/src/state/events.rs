//! Events that drive lock state transitions

/// Events that can trigger lock state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LockEvent {
    /// Object was placed into a compatible socket
    SocketAccepted,
    /// Tighten rotation reached its threshold
    TightenReached,
    /// Loosen rotation reached its threshold (socket capture restored)
    LoosenReached,
    /// Grip released after the loosen threshold was reached
    GripReleased,
    /// Object left its socket
    LeftSocket,
    /// User tried to translate the object
    TranslationAttempt,
}
