//! Per-object parameter profiles
//!
//! Plain data supplied by the host. Defaults apply to every object; an
//! [`ObjectProfile`] overrides them for one lookup key, and the step's own
//! parameters override both once, at step start.

use alloc::vec::Vec;
use core::fmt;
use heapless::String;

use super::types::{bounded, StepParams, MAX_KEY_LEN, MAX_LABEL_LEN, MAX_TAGS};
use crate::rotation::{Axis, Direction};
use crate::state::LockConfig;
use crate::traits::{EntityId, EntityResolver, SocketQuery};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which sockets accept an object
///
/// A socket is accepted if it carries any of `tags` or is listed in
/// `allow`. An empty filter accepts every socket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SocketFilter {
    /// Accepted socket tags
    pub tags: heapless::Vec<String<MAX_LABEL_LEN>, MAX_TAGS>,
    /// Accepted socket lookup keys
    pub allow: heapless::Vec<String<MAX_KEY_LEN>, MAX_TAGS>,
}

impl SocketFilter {
    /// Filter accepting sockets with `tag`
    pub fn tagged(tag: &str) -> Self {
        let mut filter = Self::default();
        if filter.tags.push(bounded(tag)).is_err() {
            warn!("socket filter full, tag {} dropped", tag);
        }
        filter
    }

    /// Add a socket lookup key to the allow-list
    ///
    /// The list holds at most [`MAX_TAGS`] keys; further keys are dropped
    /// with a warning.
    pub fn allowing(mut self, key: &str) -> Self {
        if self.allow.push(bounded(key)).is_err() {
            warn!("socket allow-list full, {} dropped", key);
        }
        self
    }

    /// Check if the filter accepts anything
    pub fn is_open(&self) -> bool {
        self.tags.is_empty() && self.allow.is_empty()
    }

    /// Check if `socket` accepts the object
    pub fn accepts<W>(&self, socket: EntityId, world: &W) -> bool
    where
        W: EntityResolver + SocketQuery + ?Sized,
    {
        if !world.is_socket(socket) {
            return false;
        }
        if self.is_open() {
            return true;
        }
        self.tags.iter().any(|tag| world.has_tag(socket, tag.as_str()))
            || self
                .allow
                .iter()
                .any(|key| world.lookup(key.as_str()) == Some(socket))
    }
}

/// Valve parameters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ValveProfile {
    /// Rotation axis while locked
    pub axis: Axis,
    /// Tightening direction
    pub tighten_direction: Direction,
    /// Tighten threshold (degrees)
    pub tighten_threshold_deg: f32,
    /// Loosen threshold (degrees)
    pub loosen_threshold_deg: f32,
    /// Angular slack (degrees)
    pub tolerance_deg: f32,
    /// Compatible sockets
    pub sockets: SocketFilter,
}

impl Default for ValveProfile {
    fn default() -> Self {
        let lock = LockConfig::default();
        Self {
            axis: lock.axis,
            tighten_direction: lock.tighten_direction,
            tighten_threshold_deg: lock.tighten_threshold_deg,
            loosen_threshold_deg: lock.loosen_threshold_deg,
            tolerance_deg: lock.tolerance_deg,
            sockets: SocketFilter::default(),
        }
    }
}

impl ValveProfile {
    /// Lock parameters with step overrides applied
    pub fn lock_config(&self, params: &StepParams) -> LockConfig {
        LockConfig {
            axis: params.axis.unwrap_or(self.axis),
            tighten_direction: params.direction.unwrap_or(self.tighten_direction),
            tighten_threshold_deg: params
                .tighten_threshold_deg
                .unwrap_or(self.tighten_threshold_deg),
            loosen_threshold_deg: params
                .loosen_threshold_deg
                .unwrap_or(self.loosen_threshold_deg),
            tolerance_deg: params.tolerance_deg.unwrap_or(self.tolerance_deg),
        }
    }

    fn validate(&self) -> Result<(), ProfileError> {
        check_threshold(self.tighten_threshold_deg, self.tolerance_deg)?;
        check_threshold(self.loosen_threshold_deg, self.tolerance_deg)
    }
}

/// Knob / turn-by-count parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KnobProfile {
    /// Rotation axis
    pub axis: Axis,
    /// Counted direction (turn-by-count) or required approach (knob)
    pub direction: Direction,
    /// Angular slack (degrees)
    pub tolerance_deg: f32,
    /// Require approaching the knob target from `direction`
    pub require_approach: bool,
}

impl Default for KnobProfile {
    fn default() -> Self {
        Self {
            axis: Axis::Y,
            direction: Direction::Clockwise,
            tolerance_deg: 5.0,
            require_approach: false,
        }
    }
}

impl KnobProfile {
    /// Effective parameters with step overrides applied
    pub fn resolve(&self, params: &StepParams) -> KnobProfile {
        KnobProfile {
            axis: params.axis.unwrap_or(self.axis),
            direction: params.direction.unwrap_or(self.direction),
            tolerance_deg: params.tolerance_deg.unwrap_or(self.tolerance_deg),
            // An explicit step direction always constrains the approach
            require_approach: self.require_approach || params.direction.is_some(),
        }
    }
}

/// Overrides for one object
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectProfile {
    /// Entity lookup key the overrides apply to
    pub key: String<MAX_KEY_LEN>,
    /// Valve overrides
    #[cfg_attr(feature = "serde", serde(default))]
    pub valve: Option<ValveProfile>,
    /// Knob overrides
    #[cfg_attr(feature = "serde", serde(default))]
    pub knob: Option<KnobProfile>,
}

/// Invalid profile values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProfileError {
    /// Threshold is zero, negative or not finite
    NonPositiveThreshold,
    /// Tolerance is negative or not finite
    NegativeTolerance,
    /// Tolerance swallows the whole threshold
    ToleranceExceedsThreshold,
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileError::NonPositiveThreshold => f.write_str("threshold must be positive"),
            ProfileError::NegativeTolerance => f.write_str("tolerance must not be negative"),
            ProfileError::ToleranceExceedsThreshold => {
                f.write_str("tolerance must be smaller than the threshold")
            }
        }
    }
}

fn check_tolerance(tolerance: f32) -> Result<(), ProfileError> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(ProfileError::NegativeTolerance);
    }
    Ok(())
}

fn check_threshold(threshold: f32, tolerance: f32) -> Result<(), ProfileError> {
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(ProfileError::NonPositiveThreshold);
    }
    check_tolerance(tolerance)?;
    if tolerance >= threshold {
        return Err(ProfileError::ToleranceExceedsThreshold);
    }
    Ok(())
}

/// Defaults plus per-object overrides
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProfileSet {
    /// Default valve parameters
    pub valve: ValveProfile,
    /// Default knob parameters
    pub knob: KnobProfile,
    /// Per-object overrides
    #[cfg_attr(feature = "serde", serde(rename = "object"))]
    pub objects: Vec<ObjectProfile>,
}

impl ProfileSet {
    fn object(&self, key: &str) -> Option<&ObjectProfile> {
        self.objects.iter().find(|o| o.key.as_str() == key)
    }

    /// Valve profile for the object with lookup key `key`
    pub fn valve_for(&self, key: &str) -> &ValveProfile {
        self.object(key)
            .and_then(|o| o.valve.as_ref())
            .unwrap_or(&self.valve)
    }

    /// Knob profile for the object with lookup key `key`
    pub fn knob_for(&self, key: &str) -> KnobProfile {
        self.object(key).and_then(|o| o.knob).unwrap_or(self.knob)
    }

    /// Check every profile, returning the offending key on failure
    pub fn validate(&self) -> Result<(), (Option<&str>, ProfileError)> {
        self.valve.validate().map_err(|e| (None, e))?;
        check_tolerance(self.knob.tolerance_deg).map_err(|e| (None, e))?;
        for object in &self.objects {
            let key = Some(object.key.as_str());
            if let Some(valve) = &object.valve {
                valve.validate().map_err(|e| (key, e))?;
            }
            if let Some(knob) = &object.knob {
                check_tolerance(knob.tolerance_deg).map_err(|e| (key, e))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockWorld;
    use alloc::vec;

    #[test]
    fn test_lock_config_overlay() {
        let profile = ValveProfile::default();
        let params = StepParams {
            axis: Some(Axis::Z),
            tighten_threshold_deg: Some(180.0),
            ..StepParams::default()
        };
        let config = profile.lock_config(&params);
        assert_eq!(config.axis, Axis::Z);
        assert_eq!(config.tighten_threshold_deg, 180.0);
        assert_eq!(config.loosen_threshold_deg, 90.0);
        assert_eq!(config.tolerance_deg, 5.0);
    }

    #[test]
    fn test_object_override() {
        let special = ValveProfile {
            tighten_threshold_deg: 270.0,
            ..ValveProfile::default()
        };
        let set = ProfileSet {
            objects: vec![ObjectProfile {
                key: bounded("big-valve"),
                valve: Some(special.clone()),
                knob: None,
            }],
            ..ProfileSet::default()
        };
        assert_eq!(set.valve_for("big-valve"), &special);
        assert_eq!(set.valve_for("small-valve"), &ValveProfile::default());
        assert_eq!(set.knob_for("big-valve"), KnobProfile::default());
    }

    #[test]
    fn test_socket_filter() {
        let mut world = MockWorld::new();
        let tagged = world.spawn_socket("flange", &["dn50"]);
        let listed = world.spawn_socket("bench", &[]);
        let other = world.spawn_socket("floor", &["dn80"]);
        let not_socket = world.spawn("valve");

        let filter = SocketFilter::tagged("dn50").allowing("bench");
        assert!(filter.accepts(tagged, &world));
        assert!(filter.accepts(listed, &world));
        assert!(!filter.accepts(other, &world));

        assert!(SocketFilter::default().accepts(other, &world));
        assert!(!SocketFilter::default().accepts(not_socket, &world));
    }

    #[test]
    fn test_allow_list_overflow_is_dropped() {
        let mut world = MockWorld::new();
        let keys = ["s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "s8"];
        let sockets: Vec<EntityId> = keys.iter().map(|k| world.spawn_socket(k, &[])).collect();

        let filter = keys.iter().fold(SocketFilter::default(), |f, k| f.allowing(k));
        assert_eq!(filter.allow.len(), MAX_TAGS);
        assert!(filter.accepts(sockets[MAX_TAGS - 1], &world));
        assert!(!filter.accepts(sockets[MAX_TAGS], &world));
    }

    #[test]
    fn test_validate() {
        assert!(ProfileSet::default().validate().is_ok());

        let mut set = ProfileSet::default();
        set.valve.tolerance_deg = -1.0;
        assert_eq!(set.validate(), Err((None, ProfileError::NegativeTolerance)));

        let mut set = ProfileSet::default();
        set.objects.push(ObjectProfile {
            key: bounded("v"),
            valve: Some(ValveProfile {
                tighten_threshold_deg: 5.0,
                ..ValveProfile::default()
            }),
            knob: None,
        });
        assert_eq!(
            set.validate(),
            Err((Some("v"), ProfileError::ToleranceExceedsThreshold))
        );

        let mut set = ProfileSet::default();
        set.valve.loosen_threshold_deg = 0.0;
        assert_eq!(set.validate(), Err((None, ProfileError::NonPositiveThreshold)));
    }
}
