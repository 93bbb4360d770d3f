//! Rotation lock for a seated object
//!
//! Wraps [`LockState`] with the rotation accumulator, the socket the object
//! sits in, and that socket's capture flag. Pure bookkeeping: callers apply
//! [`RotationLock::constraints`] and [`RotationLock::capture_enabled`] to the
//! host after every call that returns a signal.
//!
//! Loosening re-enables socket capture the moment the threshold is crossed,
//! while the grip is still held, and only unlocks on release.

use core::fmt;

use super::events::LockEvent;
use super::machine::LockState;
use crate::rotation::{Axis, Direction, RotationAccumulator};
use crate::traits::{BodyConstraints, EntityId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lock parameters, fixed for the duration of a step
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LockConfig {
    /// Axis the object may rotate about while locked
    pub axis: Axis,
    /// Direction that tightens; the opposite direction loosens
    pub tighten_direction: Direction,
    /// Rotation needed to go from loose to tight (degrees)
    pub tighten_threshold_deg: f32,
    /// Rotation needed to loosen again (degrees)
    pub loosen_threshold_deg: f32,
    /// Slack subtracted from both thresholds (degrees)
    pub tolerance_deg: f32,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            axis: Axis::Y,
            tighten_direction: Direction::Clockwise,
            tighten_threshold_deg: 90.0,
            loosen_threshold_deg: 90.0,
            tolerance_deg: 5.0,
        }
    }
}

impl LockConfig {
    /// Direction that loosens
    pub fn loosen_direction(&self) -> Direction {
        self.tighten_direction.opposite()
    }
}

/// Signals raised by the lock for step handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LockSignal {
    /// Seated in a compatible socket (now locked loose)
    Snapped,
    /// Tightened (now locked tight)
    Tightened,
    /// Loosen threshold reached; socket capture is back on, grip still held
    CaptureRestored,
    /// Grip released after loosening (now unlocked)
    Loosened,
    /// Physically separated from the socket after unlocking
    Removed,
}

/// Rejected lock operations
///
/// None of these change state; they are surfaced as warnings / haptics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InvalidTransition {
    /// Tried to translate a locked object
    TranslationWhileLocked,
    /// Socket does not accept this object
    IncompatibleSocket,
    /// Object is already locked into a socket
    AlreadySeated,
    /// Host reported removal while the lock still holds the object
    RemovedWhileLocked,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidTransition::TranslationWhileLocked => f.write_str("object is locked in place"),
            InvalidTransition::IncompatibleSocket => f.write_str("socket does not accept object"),
            InvalidTransition::AlreadySeated => f.write_str("object is already seated"),
            InvalidTransition::RemovedWhileLocked => f.write_str("object removed while locked"),
        }
    }
}

/// Per-object rotation lock
#[derive(Debug, Clone)]
pub struct RotationLock {
    state: LockState,
    config: LockConfig,
    accumulator: RotationAccumulator,
    socket: Option<EntityId>,
    capture_enabled: bool,
    loosen_reached: bool,
}

impl RotationLock {
    /// Create an unlocked, unseated lock
    pub fn new(config: LockConfig) -> Self {
        Self {
            state: LockState::Unlocked,
            config,
            accumulator: RotationAccumulator::new(),
            socket: None,
            capture_enabled: true,
            loosen_reached: false,
        }
    }

    /// Current state
    pub fn state(&self) -> LockState {
        self.state
    }

    /// Active parameters
    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Replace parameters (step start overrides); state and progress are kept
    pub fn set_config(&mut self, config: LockConfig) {
        self.config = config;
    }

    /// Rotation accumulated in the current phase (degrees)
    pub fn accumulated(&self) -> f32 {
        self.accumulator.total()
    }

    /// Socket the object sits in, if any
    pub fn socket(&self) -> Option<EntityId> {
        self.socket
    }

    /// Check if the object sits in a socket (locked or not)
    pub fn is_seated(&self) -> bool {
        self.socket.is_some()
    }

    /// Capture flag of the occupied socket
    pub fn capture_enabled(&self) -> bool {
        self.capture_enabled
    }

    /// Check if loosening is satisfied and the lock waits for release
    pub fn awaiting_release(&self) -> bool {
        self.loosen_reached
    }

    /// Constraints the lock requires, `None` while unlocked
    ///
    /// While unlocked the lock does not own the body's flags.
    pub fn constraints(&self) -> Option<BodyConstraints> {
        if self.state.is_locked() {
            Some(BodyConstraints::rotate_only(self.config.axis))
        } else {
            None
        }
    }

    /// Re-anchor rotation tracking at `angle_deg`, keeping progress
    ///
    /// Used when tracking resumes after a gap, so rotation that happened
    /// while nobody sampled is not counted.
    pub fn resync(&mut self, angle_deg: Option<f32>) {
        self.accumulator.resync(angle_deg);
    }

    fn apply(&mut self, event: LockEvent) {
        let next = self.state.transition(event);
        if next != self.state {
            debug!("lock {:?} -> {:?}", self.state, next);
            self.state = next;
            let last = self.accumulator.last_sample();
            self.accumulator.rebase(last);
        }
    }

    /// Handle a socket capturing the object
    ///
    /// Compatibility is evaluated by the caller, once, here; incompatible
    /// sockets never lock.
    pub fn place_in_socket(
        &mut self,
        socket: EntityId,
        compatible: bool,
        angle_deg: Option<f32>,
    ) -> Result<LockSignal, InvalidTransition> {
        if self.state.is_locked() {
            return Err(InvalidTransition::AlreadySeated);
        }
        if !compatible {
            return Err(InvalidTransition::IncompatibleSocket);
        }

        self.accumulator.rebase(angle_deg);
        self.apply(LockEvent::SocketAccepted);
        self.socket = Some(socket);
        self.capture_enabled = false;
        self.loosen_reached = false;
        Ok(LockSignal::Snapped)
    }

    /// Feed an orientation sample about the lock axis
    pub fn sample(&mut self, angle_deg: f32) -> Option<LockSignal> {
        match self.state {
            LockState::Unlocked => None,
            LockState::LockedLoose => {
                self.accumulator.sample(angle_deg, self.config.tighten_direction);
                if self
                    .accumulator
                    .reached(self.config.tighten_threshold_deg, self.config.tolerance_deg)
                {
                    self.apply(LockEvent::TightenReached);
                    Some(LockSignal::Tightened)
                } else {
                    None
                }
            }
            LockState::LockedTight => {
                if self.loosen_reached {
                    return None;
                }
                self.accumulator.sample(angle_deg, self.config.loosen_direction());
                if self
                    .accumulator
                    .reached(self.config.loosen_threshold_deg, self.config.tolerance_deg)
                {
                    self.loosen_reached = true;
                    self.capture_enabled = true;
                    self.apply(LockEvent::LoosenReached);
                    Some(LockSignal::CaptureRestored)
                } else {
                    None
                }
            }
        }
    }

    /// Handle the grip being released
    ///
    /// Unlocks only once loosening is satisfied. Releasing early keeps the
    /// state and the accumulated rotation so the user can resume.
    pub fn release(&mut self) -> Option<LockSignal> {
        if self.state == LockState::LockedTight && self.loosen_reached {
            self.loosen_reached = false;
            self.apply(LockEvent::GripReleased);
            return Some(LockSignal::Loosened);
        }

        if self.state.is_locked() {
            debug!(
                "grip released in {:?} at {} deg, progress kept",
                self.state,
                self.accumulator.total()
            );
        }
        None
    }

    /// Handle the object leaving `socket`
    pub fn remove_from_socket(
        &mut self,
        socket: EntityId,
    ) -> Result<Option<LockSignal>, InvalidTransition> {
        if self.socket != Some(socket) {
            return Ok(None);
        }
        if self.state.is_locked() {
            return Err(InvalidTransition::RemovedWhileLocked);
        }

        self.socket = None;
        self.capture_enabled = true;
        self.apply(LockEvent::LeftSocket);
        self.accumulator.reset();
        Ok(Some(LockSignal::Removed))
    }

    /// Handle an attempt to translate the object
    pub fn attempt_translation(&mut self) -> Result<(), InvalidTransition> {
        self.apply(LockEvent::TranslationAttempt);
        if self.state.is_locked() {
            Err(InvalidTransition::TranslationWhileLocked)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOCKET: EntityId = EntityId(7);

    fn seated(config: LockConfig) -> RotationLock {
        let mut lock = RotationLock::new(config);
        assert_eq!(
            lock.place_in_socket(SOCKET, true, Some(0.0)),
            Ok(LockSignal::Snapped)
        );
        lock
    }

    fn tightened() -> RotationLock {
        let mut lock = seated(LockConfig::default());
        lock.sample(45.0);
        assert_eq!(lock.sample(90.0), Some(LockSignal::Tightened));
        lock
    }

    #[test]
    fn test_snap_locks_and_disables_capture() {
        let lock = seated(LockConfig::default());
        assert_eq!(lock.state(), LockState::LockedLoose);
        assert_eq!(lock.socket(), Some(SOCKET));
        assert!(!lock.capture_enabled());
        assert_eq!(lock.constraints(), Some(BodyConstraints::rotate_only(Axis::Y)));
        assert_eq!(lock.accumulated(), 0.0);
    }

    #[test]
    fn test_incompatible_socket_rejected() {
        let mut lock = RotationLock::new(LockConfig::default());
        assert_eq!(
            lock.place_in_socket(SOCKET, false, Some(0.0)),
            Err(InvalidTransition::IncompatibleSocket)
        );
        assert_eq!(lock.state(), LockState::Unlocked);
        assert!(lock.capture_enabled());
        assert_eq!(lock.constraints(), None);
    }

    #[test]
    fn test_tighten_scenario() {
        // axis +Y, threshold 90, tolerance 5: completes at 85
        let mut lock = seated(LockConfig::default());
        assert_eq!(lock.sample(40.0), None);
        assert_eq!(lock.sample(80.0), None);
        assert_eq!(lock.state(), LockState::LockedLoose);

        assert_eq!(lock.sample(90.0), Some(LockSignal::Tightened));
        assert_eq!(lock.state(), LockState::LockedTight);
        assert_eq!(lock.accumulated(), 0.0);
    }

    #[test]
    fn test_tighten_tie_break() {
        let mut lock = seated(LockConfig::default());
        assert_eq!(lock.sample(84.99), None);

        let mut lock = seated(LockConfig::default());
        assert_eq!(lock.sample(85.0), Some(LockSignal::Tightened));
    }

    #[test]
    fn test_reverse_rotation_ignored_while_loose() {
        let mut lock = seated(LockConfig::default());
        lock.sample(40.0);
        lock.sample(30.0);
        lock.sample(70.0);
        assert_eq!(lock.accumulated(), 80.0);
        assert_eq!(lock.state(), LockState::LockedLoose);
    }

    #[test]
    fn test_loosen_restores_capture_before_release() {
        let mut lock = tightened();
        assert_eq!(lock.sample(45.0), None);
        assert!(!lock.capture_enabled());

        assert_eq!(lock.sample(0.0), Some(LockSignal::CaptureRestored));
        assert!(lock.capture_enabled());
        assert!(lock.awaiting_release());
        assert_eq!(lock.state(), LockState::LockedTight);

        // Further rotation does nothing until release
        assert_eq!(lock.sample(-40.0), None);

        assert_eq!(lock.release(), Some(LockSignal::Loosened));
        assert_eq!(lock.state(), LockState::Unlocked);
        assert_eq!(lock.constraints(), None);
        assert!(lock.is_seated());
    }

    #[test]
    fn test_early_release_keeps_progress() {
        let mut lock = tightened();
        lock.sample(50.0);
        assert_eq!(lock.release(), None);
        assert_eq!(lock.state(), LockState::LockedTight);
        assert_eq!(lock.accumulated(), 40.0);

        lock.sample(10.0);
        assert_eq!(lock.accumulated(), 80.0);
    }

    #[test]
    fn test_removal_after_unlock() {
        let mut lock = tightened();
        lock.sample(0.0);
        lock.release();

        assert_eq!(lock.remove_from_socket(EntityId(99)), Ok(None));
        assert_eq!(lock.remove_from_socket(SOCKET), Ok(Some(LockSignal::Removed)));
        assert!(!lock.is_seated());
    }

    #[test]
    fn test_removal_while_locked_rejected() {
        let mut lock = tightened();
        assert_eq!(
            lock.remove_from_socket(SOCKET),
            Err(InvalidTransition::RemovedWhileLocked)
        );
        assert_eq!(lock.state(), LockState::LockedTight);
    }

    #[test]
    fn test_translation_rejected_while_locked() {
        let mut lock = RotationLock::new(LockConfig::default());
        assert_eq!(lock.attempt_translation(), Ok(()));

        let mut lock = seated(LockConfig::default());
        assert_eq!(
            lock.attempt_translation(),
            Err(InvalidTransition::TranslationWhileLocked)
        );
        assert_eq!(lock.state(), LockState::LockedLoose);
    }

    #[test]
    fn test_already_seated() {
        let mut lock = seated(LockConfig::default());
        assert_eq!(
            lock.place_in_socket(EntityId(8), true, Some(0.0)),
            Err(InvalidTransition::AlreadySeated)
        );
        assert_eq!(lock.socket(), Some(SOCKET));
    }

    #[test]
    fn test_counter_clockwise_valve() {
        let config = LockConfig {
            axis: Axis::Z,
            tighten_direction: Direction::CounterClockwise,
            tighten_threshold_deg: 180.0,
            loosen_threshold_deg: 90.0,
            tolerance_deg: 0.0,
        };
        let mut lock = seated(config);
        lock.sample(300.0);
        lock.sample(240.0);
        assert_eq!(lock.sample(180.0), Some(LockSignal::Tightened));

        // Loosening is clockwise now
        lock.sample(230.0);
        assert_eq!(lock.sample(270.0), Some(LockSignal::CaptureRestored));
    }

    #[test]
    fn test_resync_skips_untracked_motion() {
        let mut lock = seated(LockConfig::default());
        assert_eq!(lock.sample(40.0), None);
        // Tracking paused; object moved to 200 meanwhile
        lock.resync(Some(200.0));
        assert_eq!(lock.accumulated(), 40.0);
        assert_eq!(lock.sample(240.0), None);
        assert_eq!(lock.sample(245.0), Some(LockSignal::Tightened));
    }
}
