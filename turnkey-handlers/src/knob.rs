//! Knob and turn-by-count steps
//!
//! Both poll the target's orientation every tick. No socket, no capture:
//! the target may be grabbed or turned by any other means.

use alloc::collections::BTreeMap;

use turnkey_core::config::{ProfileSet, Step, StepKind, StepPath};
use turnkey_core::rotation::{AngleTarget, Axis, TurnCounter, FULL_TURN_DEG};
use turnkey_core::sequence::{HandlerContext, HandlerError, Resolved, StepHandler};
use turnkey_core::traits::EntityId;

#[derive(Debug, Clone, Copy)]
enum Tracker {
    Angle(AngleTarget),
    Turns(TurnCounter),
}

#[derive(Debug, Clone, Copy)]
struct ActiveKnob {
    object: EntityId,
    axis: Axis,
    tracker: Tracker,
}

impl ActiveKnob {
    /// Feed a sample; returns the completion reason once satisfied
    fn sample(&mut self, angle_deg: f32) -> Option<&'static str> {
        match &mut self.tracker {
            Tracker::Angle(target) => target.sample(angle_deg).then_some("target-reached"),
            Tracker::Turns(counter) => counter.sample(angle_deg).then_some("turns-reached"),
        }
    }
}

/// Handler for turn-knob and turn-by-count steps
#[derive(Debug, Default)]
pub struct KnobHandler {
    profiles: ProfileSet,
    active: BTreeMap<StepPath, ActiveKnob>,
}

impl KnobHandler {
    pub fn new(profiles: ProfileSet) -> Self {
        Self {
            profiles,
            active: BTreeMap::new(),
        }
    }

    /// Turn-count progress of the step at `path`, in [0, 1]
    pub fn progress(&self, path: StepPath) -> Option<f32> {
        match self.active.get(&path)?.tracker {
            Tracker::Turns(counter) => Some(counter.progress()),
            Tracker::Angle(_) => None,
        }
    }
}

impl StepHandler for KnobHandler {
    fn name(&self) -> &'static str {
        "knob"
    }

    fn can_handle(&self, kind: StepKind) -> bool {
        kind.is_knob()
    }

    fn start_step(
        &mut self,
        path: StepPath,
        step: &Step,
        resolved: Resolved,
        cx: &mut HandlerContext<'_>,
    ) -> Result<(), HandlerError> {
        let profile = self.profiles.knob_for(step.target.key()).resolve(&step.params);
        if !profile.tolerance_deg.is_finite() || profile.tolerance_deg < 0.0 {
            return Err(HandlerError::InvalidParameter("tolerance_deg"));
        }
        let start = cx
            .world
            .angle(resolved.target, profile.axis)
            .ok_or(HandlerError::NoOrientation)?;

        let tracker = match step.kind {
            StepKind::TurnKnob => {
                let target = step
                    .params
                    .target_angle_deg
                    .ok_or(HandlerError::MissingParameter("target_angle_deg"))?;
                if !target.is_finite() {
                    return Err(HandlerError::InvalidParameter("target_angle_deg"));
                }
                let approach = profile.require_approach.then_some(profile.direction);
                Tracker::Angle(AngleTarget::new(target, profile.tolerance_deg, approach, start))
            }
            StepKind::TurnByCount => {
                let turns = step
                    .params
                    .turn_count
                    .ok_or(HandlerError::MissingParameter("turn_count"))?;
                if !turns.is_finite() || turns <= 0.0 {
                    return Err(HandlerError::InvalidParameter("turn_count"));
                }
                if profile.tolerance_deg >= turns * FULL_TURN_DEG {
                    return Err(HandlerError::InvalidParameter("tolerance_deg"));
                }
                Tracker::Turns(TurnCounter::new(
                    turns,
                    profile.direction,
                    profile.tolerance_deg,
                    Some(start),
                ))
            }
            _ => return Err(HandlerError::InvalidParameter("kind")),
        };

        debug!("knob step {:?} started at {} deg", path, start);
        self.active.insert(
            path,
            ActiveKnob {
                object: resolved.target,
                axis: profile.axis,
                tracker,
            },
        );
        Ok(())
    }

    fn stop_step(&mut self, path: StepPath, _cx: &mut HandlerContext<'_>) {
        self.active.remove(&path);
    }

    fn tick(&mut self, cx: &mut HandlerContext<'_>) {
        for (path, knob) in self.active.iter_mut() {
            let Some(angle) = cx.world.angle(knob.object, knob.axis) else {
                continue;
            };
            if let Some(reason) = knob.sample(angle) {
                cx.outbox.complete(*path, reason);
            }
        }
    }

    fn cleanup(&mut self, _cx: &mut HandlerContext<'_>) {
        self.active.clear();
    }
}
