//! In-memory world for tests
//!
//! Implements every adapter trait over a map of fake objects and records
//! each constraint and capture write so tests can count freeze cycles.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::rotation::{wrap_degrees, Axis};
use crate::traits::{
    BodyConstraints, BodyControl, ConditionSource, EntityId, EntityResolver, GrabSource,
    RotationSource, SocketQuery,
};

#[derive(Debug, Clone)]
struct MockObject {
    key: String,
    body: Option<BodyConstraints>,
    socket: bool,
    tags: Vec<String>,
    joint: bool,
    angles: [f32; 3],
    held: bool,
    satisfied: bool,
    capture: bool,
}

impl MockObject {
    fn new(key: &str, body: Option<BodyConstraints>) -> Self {
        Self {
            key: key.to_string(),
            body,
            socket: false,
            tags: Vec::new(),
            joint: false,
            angles: [0.0; 3],
            held: false,
            satisfied: false,
            capture: true,
        }
    }
}

fn axis_index(axis: Axis) -> usize {
    match axis {
        Axis::X => 0,
        Axis::Y => 1,
        Axis::Z => 2,
    }
}

/// Fake scene
#[derive(Debug, Clone, Default)]
pub struct MockWorld {
    next_id: u32,
    objects: BTreeMap<EntityId, MockObject>,
    design_time: bool,
    constraint_writes: Vec<(EntityId, BodyConstraints)>,
    capture_writes: Vec<(EntityId, bool)>,
}

impl MockWorld {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, object: MockObject) -> EntityId {
        self.next_id += 1;
        let id = EntityId(self.next_id);
        self.objects.insert(id, object);
        id
    }

    /// Movable object with a free physics body
    pub fn spawn(&mut self, key: &str) -> EntityId {
        self.insert(MockObject::new(key, Some(BodyConstraints::FREE)))
    }

    /// Socket carrying `tags`
    pub fn spawn_socket(&mut self, key: &str, tags: &[&str]) -> EntityId {
        let mut object = MockObject::new(key, Some(BodyConstraints::FROZEN));
        object.socket = true;
        object.tags = tags.iter().map(|t| t.to_string()).collect();
        self.insert(object)
    }

    /// Object without a physics body
    pub fn spawn_static(&mut self, key: &str) -> EntityId {
        self.insert(MockObject::new(key, None))
    }

    pub fn despawn(&mut self, id: EntityId) {
        self.objects.remove(&id);
    }

    pub fn rename(&mut self, id: EntityId, key: &str) {
        if let Some(object) = self.objects.get_mut(&id) {
            object.key = key.to_string();
        }
    }

    pub fn set_design_time(&mut self, design_time: bool) {
        self.design_time = design_time;
    }

    /// Attach a rotation joint to `id`
    pub fn add_joint(&mut self, id: EntityId) {
        if let Some(object) = self.objects.get_mut(&id) {
            object.joint = true;
        }
    }

    /// Set the angle about `axis` (wrapped to [0, 360))
    pub fn set_angle(&mut self, id: EntityId, axis: Axis, degrees: f32) {
        if let Some(object) = self.objects.get_mut(&id) {
            object.angles[axis_index(axis)] = wrap_degrees(degrees);
        }
    }

    /// Rotate by `delta` degrees about `axis`
    pub fn rotate(&mut self, id: EntityId, axis: Axis, delta: f32) {
        if let Some(angle) = self.angle(id, axis) {
            self.set_angle(id, axis, angle + delta);
        }
    }

    pub fn hold(&mut self, id: EntityId) {
        if let Some(object) = self.objects.get_mut(&id) {
            object.held = true;
        }
    }

    pub fn release(&mut self, id: EntityId) {
        if let Some(object) = self.objects.get_mut(&id) {
            object.held = false;
        }
    }

    /// Set the external condition attached to `id`
    pub fn satisfy(&mut self, id: EntityId, satisfied: bool) {
        if let Some(object) = self.objects.get_mut(&id) {
            object.satisfied = satisfied;
        }
    }

    /// Current constraints of `id`
    pub fn constraints_of(&self, id: EntityId) -> Option<BodyConstraints> {
        self.objects.get(&id).and_then(|o| o.body)
    }

    /// Number of constraint writes to `id`
    pub fn writes_for(&self, id: EntityId) -> usize {
        self.constraint_writes.iter().filter(|(o, _)| *o == id).count()
    }

    /// Capture flag of socket `id`
    pub fn capture_enabled(&self, id: EntityId) -> bool {
        self.objects.get(&id).is_some_and(|o| o.capture)
    }

    /// Capture writes to socket `id`, in order
    pub fn capture_writes_for(&self, id: EntityId) -> Vec<bool> {
        self.capture_writes
            .iter()
            .filter(|(s, _)| *s == id)
            .map(|(_, enabled)| *enabled)
            .collect()
    }
}

impl EntityResolver for MockWorld {
    fn is_live(&self, id: EntityId) -> bool {
        self.objects.contains_key(&id)
    }

    fn lookup(&self, key: &str) -> Option<EntityId> {
        self.objects
            .iter()
            .find(|(_, o)| o.key == key)
            .map(|(id, _)| *id)
    }

    fn is_design_time(&self) -> bool {
        self.design_time
    }
}

impl RotationSource for MockWorld {
    fn angle(&self, object: EntityId, axis: Axis) -> Option<f32> {
        self.objects.get(&object).map(|o| o.angles[axis_index(axis)])
    }
}

impl GrabSource for MockWorld {
    fn is_held(&self, object: EntityId) -> bool {
        self.objects.get(&object).is_some_and(|o| o.held)
    }
}

impl ConditionSource for MockWorld {
    fn is_satisfied(&self, subject: EntityId) -> bool {
        self.objects.get(&subject).is_some_and(|o| o.satisfied)
    }
}

impl BodyControl for MockWorld {
    fn is_trackable(&self, object: EntityId) -> bool {
        self.objects.get(&object).is_some_and(|o| o.body.is_some())
    }

    fn has_rotation_joint(&self, object: EntityId) -> bool {
        self.objects.get(&object).is_some_and(|o| o.joint)
    }

    fn constraints(&self, object: EntityId) -> Option<BodyConstraints> {
        self.constraints_of(object)
    }

    fn set_constraints(&mut self, object: EntityId, constraints: BodyConstraints) {
        if let Some(body) = self.objects.get_mut(&object).and_then(|o| o.body.as_mut()) {
            *body = constraints;
            self.constraint_writes.push((object, constraints));
        }
    }
}

impl SocketQuery for MockWorld {
    fn is_socket(&self, object: EntityId) -> bool {
        self.objects.get(&object).is_some_and(|o| o.socket)
    }

    fn has_tag(&self, socket: EntityId, tag: &str) -> bool {
        self.objects
            .get(&socket)
            .is_some_and(|o| o.tags.iter().any(|t| t == tag))
    }

    fn set_socket_capture(&mut self, socket: EntityId, enabled: bool) {
        if let Some(object) = self.objects.get_mut(&socket) {
            object.capture = enabled;
            self.capture_writes.push((socket, enabled));
        }
    }
}
