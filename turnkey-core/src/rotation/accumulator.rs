//! Directional rotation accumulator

use super::angle::{signed_delta, Direction};

/// Cumulative rotation in one direction
///
/// Each sample contributes its wraparound-corrected delta from the previous
/// sample. Only deltas along the tracked direction count; reverse deltas
/// are ignored, never subtracted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationAccumulator {
    /// Accumulated rotation in degrees (always >= 0)
    total_deg: f32,
    /// Last sampled orientation
    last_deg: Option<f32>,
}

impl RotationAccumulator {
    /// Create an empty accumulator with no orientation snapshot
    pub const fn new() -> Self {
        Self {
            total_deg: 0.0,
            last_deg: None,
        }
    }

    /// Accumulated rotation in degrees
    pub fn total(&self) -> f32 {
        self.total_deg
    }

    /// Last sampled orientation, if any
    pub fn last_sample(&self) -> Option<f32> {
        self.last_deg
    }

    /// Clear the total and the orientation snapshot
    pub fn reset(&mut self) {
        self.total_deg = 0.0;
        self.last_deg = None;
    }

    /// Clear the total and take `angle` as the new reference orientation
    pub fn rebase(&mut self, angle: Option<f32>) {
        self.total_deg = 0.0;
        self.last_deg = angle;
    }

    /// Take `angle` as the reference orientation, keeping the total
    pub fn resync(&mut self, angle: Option<f32>) {
        self.last_deg = angle;
    }

    /// Feed a new orientation sample
    ///
    /// Returns the delta that was accepted (0 when the sample moved the
    /// wrong way, or when this is the first sample).
    pub fn sample(&mut self, angle: f32, direction: Direction) -> f32 {
        if !angle.is_finite() {
            return 0.0;
        }

        let Some(previous) = self.last_deg.replace(angle) else {
            return 0.0;
        };

        let along = signed_delta(previous, angle) * direction.sign();
        if along > 0.0 {
            self.total_deg += along;
            along
        } else {
            0.0
        }
    }

    /// Check if `threshold - tolerance` has been reached
    ///
    /// Reaching the bound exactly counts.
    pub fn reached(&self, threshold_deg: f32, tolerance_deg: f32) -> bool {
        self.total_deg >= threshold_deg - tolerance_deg
    }
}
