//! Valve steps
//!
//! One [`RotationLock`] per object, kept across steps for the whole run:
//! an install step seats the valve, a later tighten step turns it, and so
//! on. The handler is the only code that writes the lock's constraints and
//! its socket's capture flag, and only while one of the object's steps is
//! active.
//!
//! Rotation is sampled every tick and once more right before a release is
//! processed, so a loosen threshold crossed in the same frame as the
//! release still re-enables capture first.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use turnkey_core::config::{ProfileSet, SocketFilter, Step, StepKind, StepPath};
use turnkey_core::sequence::{HandlerContext, HandlerError, Resolved, StepHandler};
use turnkey_core::state::{LockConfig, LockSignal, LockState, RotationLock};
use turnkey_core::traits::{BodyConstraints, EntityId, InteractionEvent};

/// Lock plus the constraints it displaced
#[derive(Debug, Clone)]
struct TrackedValve {
    lock: RotationLock,
    displaced: Option<BodyConstraints>,
}

#[derive(Debug, Clone)]
struct ActiveValve {
    object: EntityId,
    kind: StepKind,
    destination: Option<EntityId>,
    sockets: SocketFilter,
}

impl ActiveValve {
    /// Install and tighten steps accept placements; loosen / remove never
    /// re-lock the valve
    fn accepts_placement(&self) -> bool {
        matches!(self.kind, StepKind::InstallValve | StepKind::TightenValve)
    }
}

fn completion(kind: StepKind, signal: LockSignal) -> Option<&'static str> {
    match (kind, signal) {
        (StepKind::InstallValve, LockSignal::Snapped) => Some("snapped"),
        (StepKind::TightenValve, LockSignal::Tightened) => Some("tightened"),
        (StepKind::LoosenValve, LockSignal::Loosened) => Some("loosened"),
        (StepKind::RemoveValve, LockSignal::Removed) => Some("removed"),
        _ => None,
    }
}

/// Goal already met when the step starts
fn satisfied(kind: StepKind, lock: &RotationLock) -> Option<&'static str> {
    match kind {
        StepKind::InstallValve if lock.state().is_locked() => Some("snapped"),
        StepKind::TightenValve if lock.state() == LockState::LockedTight => Some("tightened"),
        StepKind::LoosenValve if lock.state() == LockState::Unlocked && lock.is_seated() => {
            Some("loosened")
        }
        _ => None,
    }
}

fn check(config: &LockConfig) -> Result<(), HandlerError> {
    let positive = |v: f32| v.is_finite() && v > 0.0;
    if !positive(config.tighten_threshold_deg) {
        return Err(HandlerError::InvalidParameter("tighten_threshold_deg"));
    }
    if !positive(config.loosen_threshold_deg) {
        return Err(HandlerError::InvalidParameter("loosen_threshold_deg"));
    }
    let tolerance = config.tolerance_deg;
    if !tolerance.is_finite()
        || tolerance < 0.0
        || tolerance >= config.tighten_threshold_deg.min(config.loosen_threshold_deg)
    {
        return Err(HandlerError::InvalidParameter("tolerance_deg"));
    }
    Ok(())
}

/// Handler for install / tighten / loosen / remove valve steps
#[derive(Debug, Default)]
pub struct ValveHandler {
    profiles: ProfileSet,
    valves: BTreeMap<EntityId, TrackedValve>,
    active: BTreeMap<StepPath, ActiveValve>,
}

impl ValveHandler {
    pub fn new(profiles: ProfileSet) -> Self {
        Self {
            profiles,
            valves: BTreeMap::new(),
            active: BTreeMap::new(),
        }
    }

    /// Lock of `object`, if it took part in a valve step this run
    pub fn lock(&self, object: EntityId) -> Option<&RotationLock> {
        self.valves.get(&object).map(|t| &t.lock)
    }

    fn is_tracked(&self, object: EntityId) -> bool {
        self.active.values().any(|a| a.object == object)
    }

    fn active_objects(&self) -> Vec<EntityId> {
        let mut objects: Vec<EntityId> = self.active.values().map(|a| a.object).collect();
        objects.sort_unstable();
        objects.dedup();
        objects
    }

    /// Apply the side effects of `signal` and complete matching steps
    fn on_signal(&mut self, object: EntityId, signal: LockSignal, cx: &mut HandlerContext<'_>) {
        let Some(tracked) = self.valves.get_mut(&object) else {
            return;
        };
        info!("valve {:?}: {:?}", object, signal);

        match signal {
            LockSignal::Snapped => {
                if tracked.displaced.is_none() {
                    tracked.displaced = cx.world.constraints(object);
                }
                if let Some(constraints) = tracked.lock.constraints() {
                    cx.world.set_constraints(object, constraints);
                }
                if let Some(socket) = tracked.lock.socket() {
                    cx.world.set_socket_capture(socket, false);
                }
            }
            LockSignal::CaptureRestored => {
                if let Some(socket) = tracked.lock.socket() {
                    cx.world.set_socket_capture(socket, true);
                }
            }
            LockSignal::Loosened => {
                if let Some(constraints) = tracked.displaced.take() {
                    cx.world.set_constraints(object, constraints);
                }
            }
            LockSignal::Tightened | LockSignal::Removed => {}
        }

        for (path, active) in &self.active {
            if active.object != object {
                continue;
            }
            if let Some(reason) = completion(active.kind, signal) {
                cx.outbox.complete(*path, reason);
            }
        }
    }

    /// Sample `object`, then unlock it if loosening is done and nobody
    /// holds it
    fn poll(&mut self, object: EntityId, cx: &mut HandlerContext<'_>) {
        let Some(tracked) = self.valves.get_mut(&object) else {
            return;
        };
        let sampled = cx
            .world
            .angle(object, tracked.lock.config().axis)
            .and_then(|angle| tracked.lock.sample(angle));
        if let Some(signal) = sampled {
            self.on_signal(object, signal, cx);
        }
        let awaiting = self
            .valves
            .get(&object)
            .is_some_and(|t| t.lock.awaiting_release());
        if awaiting && !cx.world.is_held(object) {
            self.release(object, cx);
        }
    }

    fn release(&mut self, object: EntityId, cx: &mut HandlerContext<'_>) {
        let signal = self
            .valves
            .get_mut(&object)
            .and_then(|tracked| tracked.lock.release());
        if let Some(signal) = signal {
            self.on_signal(object, signal, cx);
        }
    }

    fn place(&mut self, object: EntityId, socket: EntityId, cx: &mut HandlerContext<'_>) {
        let Some(active) = self
            .active
            .values()
            .find(|a| a.object == object && a.accepts_placement())
        else {
            return;
        };
        let compatible = match active.destination {
            Some(expected) => expected == socket && cx.world.is_socket(socket),
            None => active.sockets.accepts(socket, &*cx.world),
        };

        let Some(tracked) = self.valves.get_mut(&object) else {
            return;
        };
        let angle = cx.world.angle(object, tracked.lock.config().axis);
        match tracked.lock.place_in_socket(socket, compatible, angle) {
            Ok(signal) => self.on_signal(object, signal, cx),
            Err(e) => {
                warn!("valve {:?} not seated in {:?}: {}", object, socket, e);
                cx.outbox.notify(object, e);
            }
        }
    }

    fn remove(&mut self, object: EntityId, socket: EntityId, cx: &mut HandlerContext<'_>) {
        let Some(tracked) = self.valves.get_mut(&object) else {
            return;
        };
        match tracked.lock.remove_from_socket(socket) {
            Ok(Some(signal)) => self.on_signal(object, signal, cx),
            Ok(None) => {}
            Err(e) => {
                warn!("valve {:?} left {:?} while locked", object, socket);
                cx.outbox.notify(object, e);
            }
        }
    }

    fn translate(&mut self, object: EntityId, cx: &mut HandlerContext<'_>) {
        let Some(tracked) = self.valves.get_mut(&object) else {
            return;
        };
        if let Err(e) = tracked.lock.attempt_translation() {
            warn!("valve {:?}: {}", object, e);
            cx.outbox.notify(object, e);
        }
    }
}

impl StepHandler for ValveHandler {
    fn name(&self) -> &'static str {
        "valve"
    }

    fn can_handle(&self, kind: StepKind) -> bool {
        kind.is_valve()
    }

    fn start_step(
        &mut self,
        path: StepPath,
        step: &Step,
        resolved: Resolved,
        cx: &mut HandlerContext<'_>,
    ) -> Result<(), HandlerError> {
        if !step.kind.is_valve() {
            return Err(HandlerError::InvalidParameter("kind"));
        }
        let profile = self.profiles.valve_for(step.target.key());
        let config = profile.lock_config(&step.params);
        check(&config)?;

        let object = resolved.target;
        let angle = cx
            .world
            .angle(object, config.axis)
            .ok_or(HandlerError::NoOrientation)?;

        let tracked = self.valves.entry(object).or_insert_with(|| TrackedValve {
            lock: RotationLock::new(config),
            displaced: None,
        });
        tracked.lock.set_config(config);
        tracked.lock.resync(Some(angle));
        // Take the body back from whoever held it between steps
        if let Some(constraints) = tracked.lock.constraints() {
            cx.world.set_constraints(object, constraints);
        }
        let done = satisfied(step.kind, &tracked.lock);

        self.active.insert(
            path,
            ActiveValve {
                object,
                kind: step.kind,
                destination: resolved.destination,
                sockets: profile.sockets.clone(),
            },
        );
        debug!("valve step {:?} on {:?} started", path, object);

        if let Some(reason) = done {
            cx.outbox.complete(path, reason);
        }
        Ok(())
    }

    fn stop_step(&mut self, path: StepPath, _cx: &mut HandlerContext<'_>) {
        if self.active.remove(&path).is_some() {
            debug!("valve step {:?} stopped", path);
        }
    }

    fn on_interaction(&mut self, event: &InteractionEvent, cx: &mut HandlerContext<'_>) {
        let Some(object) = event.object() else {
            return;
        };
        if !self.is_tracked(object) {
            return;
        }
        match *event {
            InteractionEvent::Released { .. } => {
                // Rotation first: capture must be back on before unlocking
                self.poll(object, cx);
                self.release(object, cx);
            }
            InteractionEvent::PlacedInSocket { socket, .. } => self.place(object, socket, cx),
            InteractionEvent::RemovedFromSocket { socket, .. } => self.remove(object, socket, cx),
            InteractionEvent::TranslationAttempted { .. } => self.translate(object, cx),
            _ => {}
        }
    }

    fn tick(&mut self, cx: &mut HandlerContext<'_>) {
        for object in self.active_objects() {
            self.poll(object, cx);
        }
    }

    fn cleanup(&mut self, cx: &mut HandlerContext<'_>) {
        for tracked in self.valves.values() {
            if let Some(socket) = tracked.lock.socket() {
                if !tracked.lock.capture_enabled() {
                    cx.world.set_socket_capture(socket, true);
                }
            }
        }
        self.valves.clear();
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Rig;
    use alloc::boxed::Box;
    use turnkey_core::config::{EntityReference, StepParams, ValveProfile};
    use turnkey_core::rotation::Axis;
    use turnkey_core::sequence::Notice;
    use turnkey_core::state::InvalidTransition;
    use turnkey_core::traits::AgentId;

    const INSTALL: StepPath = StepPath::new(0, 0, 0);
    const TIGHTEN: StepPath = StepPath::new(0, 0, 1);
    const LOOSEN: StepPath = StepPath::new(0, 0, 2);
    const REMOVE: StepPath = StepPath::new(0, 0, 3);

    struct Bench {
        rig: Rig,
        valve: EntityId,
        flange: EntityId,
    }

    fn step(kind: StepKind) -> Step {
        Step::new(kind.name(), kind, EntityReference::by_key("valve"))
            .with_destination(EntityReference::by_key("flange"))
    }

    fn bench_with(profiles: ProfileSet) -> Bench {
        let mut rig = Rig::new(Box::new(ValveHandler::new(profiles)));
        let valve = rig.world.spawn("valve");
        let flange = rig.world.spawn_socket("flange", &["dn50"]);
        Bench { rig, valve, flange }
    }

    fn bench() -> Bench {
        bench_with(ProfileSet::default())
    }

    impl Bench {
        fn turn(&mut self, delta: f32) {
            self.rig.world.rotate(self.valve, Axis::Y, delta);
            self.rig.tick();
        }

        fn released(&mut self) {
            self.rig.world.release(self.valve);
            self.rig.event(InteractionEvent::Released {
                object: self.valve,
                agent: AgentId(1),
            });
        }

        fn install(&mut self) {
            assert!(self.rig.start(INSTALL, &step(StepKind::InstallValve)).is_ok());
            self.rig.event(InteractionEvent::PlacedInSocket {
                object: self.valve,
                socket: self.flange,
            });
            assert_eq!(self.rig.completions(), [(INSTALL, "snapped")]);
            self.rig.stop(INSTALL);
        }

        fn tighten(&mut self) {
            assert!(self.rig.start(TIGHTEN, &step(StepKind::TightenValve)).is_ok());
            self.turn(45.0);
            self.turn(45.0);
            assert_eq!(self.rig.completions(), [(TIGHTEN, "tightened")]);
            self.rig.stop(TIGHTEN);
        }

        /// Body is held rotate-only by the lock
        fn is_locked(&self) -> bool {
            self.rig.world.constraints_of(self.valve) == Some(BodyConstraints::rotate_only(Axis::Y))
        }
    }

    #[test]
    fn test_install_locks_and_disables_capture() {
        let mut b = bench();
        b.install();
        assert!(b.is_locked());
        assert!(!b.rig.world.capture_enabled(b.flange));
    }

    #[test]
    fn test_incompatible_socket_is_a_notice() {
        let profiles = ProfileSet {
            valve: ValveProfile {
                sockets: SocketFilter::tagged("dn50"),
                ..ValveProfile::default()
            },
            ..ProfileSet::default()
        };
        let mut b = bench_with(profiles);
        let floor = b.rig.world.spawn_socket("floor", &["dn80"]);
        let install = Step::new("install", StepKind::InstallValve, EntityReference::by_key("valve"));
        assert!(b.rig.start(INSTALL, &install).is_ok());

        b.rig.event(InteractionEvent::PlacedInSocket {
            object: b.valve,
            socket: floor,
        });
        assert!(b.rig.completions().is_empty());
        assert_eq!(
            b.rig.notices(),
            [Notice {
                object: b.valve,
                kind: InvalidTransition::IncompatibleSocket
            }]
        );
        assert_eq!(b.rig.world.constraints_of(b.valve), Some(BodyConstraints::FREE));

        b.rig.event(InteractionEvent::PlacedInSocket {
            object: b.valve,
            socket: b.flange,
        });
        assert_eq!(b.rig.completions(), [(INSTALL, "snapped")]);
    }

    #[test]
    fn test_tighten_needs_threshold_minus_tolerance() {
        let mut b = bench();
        b.install();
        assert!(b.rig.start(TIGHTEN, &step(StepKind::TightenValve)).is_ok());
        b.turn(40.0);
        b.turn(-10.0);
        b.turn(40.0);
        // 80 accumulated, reverse turn ignored
        assert!(b.rig.completions().is_empty());
        b.turn(5.0);
        assert_eq!(b.rig.completions(), [(TIGHTEN, "tightened")]);
        // Still rotate-only while tight
        assert!(b.is_locked());
    }

    #[test]
    fn test_loosen_restores_capture_before_release_same_frame() {
        let mut b = bench();
        b.install();
        b.tighten();

        b.rig.world.hold(b.valve);
        assert!(b.rig.start(LOOSEN, &step(StepKind::LoosenValve)).is_ok());
        b.turn(-50.0);
        assert!(b.rig.completions().is_empty());

        // Threshold crossed and grip released in the same frame, no tick
        b.rig.world.rotate(b.valve, Axis::Y, -40.0);
        b.released();

        assert_eq!(b.rig.world.capture_writes_for(b.flange), [false, true]);
        assert_eq!(b.rig.completions(), [(LOOSEN, "loosened")]);
        assert_eq!(b.rig.world.constraints_of(b.valve), Some(BodyConstraints::FREE));
    }

    #[test]
    fn test_capture_restored_while_still_held() {
        let mut b = bench();
        b.install();
        b.tighten();

        b.rig.world.hold(b.valve);
        assert!(b.rig.start(LOOSEN, &step(StepKind::LoosenValve)).is_ok());
        b.turn(-45.0);
        b.turn(-45.0);
        assert!(b.rig.world.capture_enabled(b.flange));
        // Not unlocked until the hand lets go
        assert!(b.rig.completions().is_empty());
        assert!(b.is_locked());

        b.released();
        assert_eq!(b.rig.completions(), [(LOOSEN, "loosened")]);
        assert!(!b.is_locked());
    }

    #[test]
    fn test_early_release_keeps_progress() {
        let mut b = bench();
        b.install();
        b.tighten();

        b.rig.world.hold(b.valve);
        assert!(b.rig.start(LOOSEN, &step(StepKind::LoosenValve)).is_ok());
        b.turn(-50.0);
        b.released();
        assert!(b.rig.completions().is_empty());
        assert!(!b.rig.world.capture_enabled(b.flange));

        b.rig.world.hold(b.valve);
        b.turn(-35.0);
        assert!(b.rig.world.capture_enabled(b.flange));
        b.released();
        assert_eq!(b.rig.completions(), [(LOOSEN, "loosened")]);
    }

    #[test]
    fn test_translation_while_locked_is_a_notice() {
        let mut b = bench();
        b.install();
        assert!(b.rig.start(TIGHTEN, &step(StepKind::TightenValve)).is_ok());
        b.rig.event(InteractionEvent::TranslationAttempted { object: b.valve });
        assert_eq!(
            b.rig.notices(),
            [Notice {
                object: b.valve,
                kind: InvalidTransition::TranslationWhileLocked
            }]
        );
    }

    #[test]
    fn test_full_cycle_ends_with_removal() {
        let mut b = bench();
        b.install();
        b.tighten();
        assert!(b.rig.start(LOOSEN, &step(StepKind::LoosenValve)).is_ok());
        b.turn(-90.0);
        // Not held: unlocks on the same tick
        assert_eq!(b.rig.completions(), [(LOOSEN, "loosened")]);
        b.rig.stop(LOOSEN);

        assert!(b.rig.start(REMOVE, &step(StepKind::RemoveValve)).is_ok());
        // Loosen / remove steps never re-lock
        b.rig.event(InteractionEvent::PlacedInSocket {
            object: b.valve,
            socket: b.flange,
        });
        assert!(b.rig.notices().is_empty());
        assert!(b.rig.completions().is_empty());

        b.rig.event(InteractionEvent::RemovedFromSocket {
            object: b.valve,
            socket: b.flange,
        });
        assert_eq!(b.rig.completions(), [(REMOVE, "removed")]);
    }

    #[test]
    fn test_removal_while_locked_is_a_notice() {
        let mut b = bench();
        b.install();
        assert!(b.rig.start(REMOVE, &step(StepKind::RemoveValve)).is_ok());
        b.rig.event(InteractionEvent::RemovedFromSocket {
            object: b.valve,
            socket: b.flange,
        });
        assert!(b.rig.completions().is_empty());
        assert_eq!(
            b.rig.notices(),
            [Notice {
                object: b.valve,
                kind: InvalidTransition::RemovedWhileLocked
            }]
        );
    }

    #[test]
    fn test_goal_met_at_start() {
        let mut b = bench();
        b.install();
        b.tighten();
        assert!(b.rig.start(TIGHTEN, &step(StepKind::TightenValve)).is_ok());
        assert_eq!(b.rig.completions(), [(TIGHTEN, "tightened")]);
    }

    #[test]
    fn test_step_params_override_profile() {
        let mut b = bench();
        b.install();
        let tighten = step(StepKind::TightenValve).with_params(StepParams {
            tighten_threshold_deg: Some(180.0),
            ..StepParams::default()
        });
        assert!(b.rig.start(TIGHTEN, &tighten).is_ok());
        b.turn(90.0);
        assert!(b.rig.completions().is_empty());
        b.turn(85.0);
        assert_eq!(b.rig.completions(), [(TIGHTEN, "tightened")]);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut b = bench();
        let bad = step(StepKind::TightenValve).with_params(StepParams {
            tolerance_deg: Some(120.0),
            ..StepParams::default()
        });
        assert_eq!(
            b.rig.start(TIGHTEN, &bad),
            Err(HandlerError::InvalidParameter("tolerance_deg"))
        );
        assert!(!b.rig.registry.is_active(TIGHTEN));
    }

    #[test]
    fn test_cleanup_reenables_capture() {
        let mut b = bench();
        b.install();
        assert!(!b.rig.world.capture_enabled(b.flange));
        b.rig.cleanup();
        assert!(b.rig.world.capture_enabled(b.flange));
    }
}
