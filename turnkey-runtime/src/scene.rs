//! Host world wrapper
//!
//! Forwards every adapter call to the host integration and overlays the
//! session's design-time switch on entity resolution.

use turnkey_core::rotation::Axis;
use turnkey_core::traits::{
    BodyConstraints, BodyControl, ConditionSource, EntityId, EntityResolver, GrabSource,
    RotationSource, SocketQuery,
};

/// Host integration as seen by one session
#[derive(Debug, Clone, Default)]
pub struct Scene<W> {
    inner: W,
    design_time: bool,
}

impl<W> Scene<W> {
    pub fn new(inner: W, design_time: bool) -> Self {
        Self { inner, design_time }
    }

    pub fn get(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn set_design_time(&mut self, design_time: bool) {
        self.design_time = design_time;
    }
}

impl<W: EntityResolver> EntityResolver for Scene<W> {
    fn is_live(&self, id: EntityId) -> bool {
        self.inner.is_live(id)
    }

    fn lookup(&self, key: &str) -> Option<EntityId> {
        self.inner.lookup(key)
    }

    fn is_design_time(&self) -> bool {
        self.design_time || self.inner.is_design_time()
    }
}

impl<W: RotationSource> RotationSource for Scene<W> {
    fn angle(&self, object: EntityId, axis: Axis) -> Option<f32> {
        self.inner.angle(object, axis)
    }
}

impl<W: GrabSource> GrabSource for Scene<W> {
    fn is_held(&self, object: EntityId) -> bool {
        self.inner.is_held(object)
    }
}

impl<W: BodyControl> BodyControl for Scene<W> {
    fn is_trackable(&self, object: EntityId) -> bool {
        self.inner.is_trackable(object)
    }

    fn has_rotation_joint(&self, object: EntityId) -> bool {
        self.inner.has_rotation_joint(object)
    }

    fn constraints(&self, object: EntityId) -> Option<BodyConstraints> {
        self.inner.constraints(object)
    }

    fn set_constraints(&mut self, object: EntityId, constraints: BodyConstraints) {
        self.inner.set_constraints(object, constraints);
    }
}

impl<W: SocketQuery> SocketQuery for Scene<W> {
    fn is_socket(&self, object: EntityId) -> bool {
        self.inner.is_socket(object)
    }

    fn has_tag(&self, socket: EntityId, tag: &str) -> bool {
        self.inner.has_tag(socket, tag)
    }

    fn set_socket_capture(&mut self, socket: EntityId, enabled: bool) {
        self.inner.set_socket_capture(socket, enabled);
    }
}

impl<W: ConditionSource> ConditionSource for Scene<W> {
    fn is_satisfied(&self, subject: EntityId) -> bool {
        self.inner.is_satisfied(subject)
    }
}
