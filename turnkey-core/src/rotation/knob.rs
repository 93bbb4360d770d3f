//! Knob and turn-count trackers
//!
//! Simpler siblings of the valve lock: no socket, no capture lifecycle.
//! They work on any rotatable object, grabbed or not.

use super::accumulator::RotationAccumulator;
use super::angle::{shortest_arc, signed_delta, Direction, FULL_TURN_DEG};

/// Absolute-angle target for a knob
///
/// Completes when the knob sits within `tolerance` of `target` (shortest
/// arc). With a required approach direction, the knob's net travel since
/// the step started must also point strictly that way. Travel is summed
/// sample by sample, so targets more than half a turn away are judged on
/// the way the knob actually went.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleTarget {
    target_deg: f32,
    tolerance_deg: f32,
    approach: Option<Direction>,
    start_deg: f32,
    last_deg: f32,
    travel_deg: f32,
}

impl AngleTarget {
    /// Create a target, recording the knob's angle at step start
    pub fn new(
        target_deg: f32,
        tolerance_deg: f32,
        approach: Option<Direction>,
        start_deg: f32,
    ) -> Self {
        Self {
            target_deg,
            tolerance_deg,
            approach,
            start_deg,
            last_deg: start_deg,
            travel_deg: 0.0,
        }
    }

    /// Target angle
    pub fn target(&self) -> f32 {
        self.target_deg
    }

    /// Angle recorded at step start
    pub fn start(&self) -> f32 {
        self.start_deg
    }

    /// Signed net rotation since the start, positive clockwise
    pub fn travel(&self) -> f32 {
        self.travel_deg
    }

    /// Check whether `angle` is on target
    pub fn is_within(&self, angle_deg: f32) -> bool {
        shortest_arc(angle_deg, self.target_deg) <= self.tolerance_deg
    }

    /// Check whether the net travel so far satisfies the approach direction
    pub fn approach_ok(&self) -> bool {
        match self.approach {
            None => true,
            Some(direction) => self.travel_deg * direction.sign() > 0.0,
        }
    }

    /// Sample the knob; returns true once the target is satisfied
    pub fn sample(&mut self, angle_deg: f32) -> bool {
        if !angle_deg.is_finite() {
            return false;
        }
        self.travel_deg += signed_delta(self.last_deg, angle_deg);
        self.last_deg = angle_deg;
        self.is_within(angle_deg) && self.approach_ok()
    }
}

/// Directional turn counter
///
/// Accumulates rotation in one direction, completing at
/// `turns × 360° − tolerance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnCounter {
    accumulator: RotationAccumulator,
    direction: Direction,
    required_deg: f32,
    tolerance_deg: f32,
}

impl TurnCounter {
    /// Create a counter with `start_deg` as the reference orientation
    pub fn new(turns: f32, direction: Direction, tolerance_deg: f32, start_deg: Option<f32>) -> Self {
        let mut accumulator = RotationAccumulator::new();
        accumulator.rebase(start_deg);
        Self {
            accumulator,
            direction,
            required_deg: turns * FULL_TURN_DEG,
            tolerance_deg,
        }
    }

    /// Rotation accumulated so far, in degrees
    pub fn accumulated(&self) -> f32 {
        self.accumulator.total()
    }

    /// Rotation required for completion, before tolerance
    pub fn required(&self) -> f32 {
        self.required_deg
    }

    /// Tracked direction
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Progress in [0, 1]
    pub fn progress(&self) -> f32 {
        let goal = self.required_deg - self.tolerance_deg;
        if goal <= 0.0 {
            return 1.0;
        }
        (self.accumulator.total() / goal).clamp(0.0, 1.0)
    }

    /// Check if the turn count has been reached
    pub fn is_complete(&self) -> bool {
        self.accumulator.reached(self.required_deg, self.tolerance_deg)
    }

    /// Sample the orientation; returns true once complete
    pub fn sample(&mut self, angle_deg: f32) -> bool {
        self.accumulator.sample(angle_deg, self.direction);
        self.is_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(counter: &mut TurnCounter, from: f32, total: f32, step: f32) -> bool {
        let mut turned = 0.0;
        let mut done = false;
        while turned < total {
            let inc = if total - turned < step { total - turned } else { step };
            turned += inc;
            done = counter.sample(from + turned);
        }
        done
    }

    #[test]
    fn test_half_turn_completes_within_tolerance() {
        let mut counter = TurnCounter::new(0.5, Direction::Clockwise, 15.0, Some(0.0));
        assert!(turn(&mut counter, 0.0, 165.0, 15.0));
    }

    #[test]
    fn test_half_turn_short_of_tolerance() {
        let mut counter = TurnCounter::new(0.5, Direction::Clockwise, 15.0, Some(0.0));
        assert!(!turn(&mut counter, 0.0, 150.0, 15.0));
        assert!(counter.progress() < 1.0);
    }

    #[test]
    fn test_wrong_direction_does_not_count() {
        let mut counter = TurnCounter::new(0.5, Direction::Clockwise, 15.0, Some(0.0));
        for i in 1..=17 {
            assert!(!counter.sample(-10.0 * i as f32));
        }
        assert_eq!(counter.accumulated(), 0.0);
    }

    #[test]
    fn test_multiple_turns_across_wrap() {
        let mut counter = TurnCounter::new(2.0, Direction::CounterClockwise, 5.0, Some(10.0));
        let mut angle = 10.0f32;
        let mut done = false;
        for _ in 0..72 {
            angle -= 10.0;
            done = counter.sample(angle % 360.0);
        }
        // 720° clears 720 - 5
        assert!(done);
    }

    #[test]
    fn test_angle_target_without_approach() {
        let mut target = AngleTarget::new(90.0, 5.0, None, 0.0);
        assert!(!target.sample(80.0));
        assert!(target.sample(86.0));
        assert!(target.sample(94.0));
    }

    #[test]
    fn test_angle_target_across_zero() {
        let mut target = AngleTarget::new(0.0, 5.0, None, 90.0);
        assert!(target.sample(357.0));
        assert!(target.sample(3.0));
    }

    #[test]
    fn test_angle_target_requires_approach_direction() {
        let mut target = AngleTarget::new(90.0, 5.0, Some(Direction::Clockwise), 30.0);
        assert!(target.sample(90.0));

        // Started past the target: reaching it means turning back
        let mut target = AngleTarget::new(90.0, 5.0, Some(Direction::Clockwise), 120.0);
        assert!(!target.sample(90.0));
    }

    #[test]
    fn test_angle_target_already_there_with_approach() {
        // No movement yet: not strictly toward the limit
        let mut target = AngleTarget::new(90.0, 5.0, Some(Direction::Clockwise), 90.0);
        assert!(!target.sample(90.0));
    }

    #[test]
    fn test_angle_target_more_than_half_a_turn_away() {
        let mut target = AngleTarget::new(270.0, 5.0, Some(Direction::Clockwise), 0.0);
        let mut done = false;
        for step in 1..=9 {
            done = target.sample(30.0 * step as f32);
        }
        assert!(done);
        assert_eq!(target.travel(), 270.0);

        // Same end angle, reached the short way round
        let mut target = AngleTarget::new(270.0, 5.0, Some(Direction::Clockwise), 0.0);
        for step in 1..=3 {
            done = target.sample(360.0 - 30.0 * step as f32);
        }
        assert!(!done);
        assert_eq!(target.travel(), -90.0);
    }
}
