//! Freeze / unfreeze with lookahead
//!
//! Every trackable object referenced anywhere in the program is frozen at
//! program start. A step's target is unfrozen when the step activates and,
//! once it completes, stays unfrozen only while a remaining step still
//! references it. Destinations are never unfrozen by activation; they stay
//! fixed as anchors.
//!
//! Objects of parallel steps are exempt for the whole group. Objects held
//! by the user are never frozen; the freeze is retried at the next step
//! boundary instead.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use crate::config::{GroupCursor, Program, StepPath};
use crate::sequence::{Resolved, SequenceObserver};
use crate::traits::{BodyConstraints, EntityId, World};

/// Freeze bookkeeping for one object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FreezeRecord {
    /// Constraints before the first freeze
    pub original: BodyConstraints,
    /// Currently frozen
    pub frozen: bool,
}

/// Flow restriction manager
#[derive(Debug, Clone)]
pub struct FlowRestriction {
    enabled: bool,
    records: BTreeMap<EntityId, FreezeRecord>,
    exempt: BTreeSet<EntityId>,
    retry: BTreeSet<EntityId>,
}

impl Default for FlowRestriction {
    fn default() -> Self {
        Self::new(true)
    }
}

impl FlowRestriction {
    /// Create a manager; a disabled one ignores every hook
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            records: BTreeMap::new(),
            exempt: BTreeSet::new(),
            retry: BTreeSet::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record for `object`, if it was ever frozen
    pub fn record(&self, object: EntityId) -> Option<&FreezeRecord> {
        self.records.get(&object)
    }

    /// Check if `object` is currently frozen by this manager
    pub fn is_frozen(&self, object: EntityId) -> bool {
        self.records.get(&object).is_some_and(|r| r.frozen)
    }

    /// Check if `object` is exempt for the current group
    pub fn is_exempt(&self, object: EntityId) -> bool {
        self.exempt.contains(&object)
    }

    /// Objects whose freeze was skipped and awaits a retry
    pub fn pending_retries(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.retry.iter().copied()
    }

    /// Number of frozen objects
    pub fn frozen_count(&self) -> usize {
        self.records.values().filter(|r| r.frozen).count()
    }

    fn is_candidate(world: &dyn World, object: EntityId) -> bool {
        world.is_trackable(object) && !world.is_socket(object) && !world.has_rotation_joint(object)
    }

    /// Freeze `object`
    ///
    /// Returns `true` if the object is frozen afterwards. Held objects are
    /// queued for a retry instead.
    pub fn freeze(&mut self, object: EntityId, world: &mut dyn World) -> bool {
        if self.exempt.contains(&object) || !Self::is_candidate(world, object) {
            return false;
        }
        if self.is_frozen(object) {
            return true;
        }
        if world.is_held(object) {
            debug!("{:?} is held, freeze deferred", object);
            self.retry.insert(object);
            return false;
        }

        // Snapshot only on the first freeze
        let original = match self.records.get(&object) {
            Some(record) => record.original,
            None => match world.constraints(object) {
                Some(current) => current,
                None => return false,
            },
        };
        self.records.insert(
            object,
            FreezeRecord {
                original,
                frozen: true,
            },
        );
        world.set_constraints(object, BodyConstraints::FROZEN);
        self.retry.remove(&object);
        trace!("{:?} frozen", object);
        true
    }

    /// Restore the snapshot of `object`; no-op if it is not frozen
    pub fn unfreeze(&mut self, object: EntityId, world: &mut dyn World) -> bool {
        self.retry.remove(&object);
        match self.records.get_mut(&object) {
            Some(record) if record.frozen => {
                record.frozen = false;
                world.set_constraints(object, record.original);
                trace!("{:?} unfrozen", object);
                true
            }
            _ => false,
        }
    }

    /// Retry deferred freezes
    pub fn retry_pending(&mut self, world: &mut dyn World) {
        let pending: Vec<EntityId> = self.retry.iter().copied().collect();
        for object in pending {
            self.freeze(object, world);
        }
    }

    /// Restore every snapshot and forget all records
    pub fn release_all(&mut self, world: &mut dyn World) {
        for (object, record) in &self.records {
            if record.frozen {
                world.set_constraints(*object, record.original);
            }
        }
        debug!("released {} object(s)", self.records.len());
        self.records.clear();
        self.exempt.clear();
        self.retry.clear();
    }

    /// Targets of parallel steps in `group`
    fn parallel_objects(program: &Program, group: GroupCursor, world: &dyn World) -> BTreeSet<EntityId> {
        program
            .group(group)
            .into_iter()
            .flat_map(|g| g.steps.iter())
            .filter(|step| step.allow_parallel)
            .filter_map(|step| step.target.resolve(world))
            .collect()
    }

    /// Check if a remaining step other than `path` references `object`
    fn referenced_later(program: &Program, path: StepPath, object: EntityId, world: &dyn World) -> bool {
        program.remaining_after(path).any(|(_, step)| {
            step.references()
                .any(|reference| reference.resolve(world) == Some(object))
        })
    }

    /// Check if an unfinished step in a group after `group` references `object`
    fn referenced_after_group(
        program: &Program,
        group: GroupCursor,
        object: EntityId,
        world: &dyn World,
    ) -> bool {
        program
            .steps()
            .filter(|(p, step)| p.group_cursor() > group && !step.is_finished())
            .any(|(_, step)| {
                step.references()
                    .any(|reference| reference.resolve(world) == Some(object))
            })
    }
}

impl SequenceObserver for FlowRestriction {
    fn program_started(&mut self, program: &Program, world: &mut dyn World) {
        if !self.enabled {
            return;
        }
        self.records.clear();
        self.retry.clear();
        self.exempt = match program.first_group() {
            Some(group) => Self::parallel_objects(program, group, &*world),
            None => BTreeSet::new(),
        };

        let objects: BTreeSet<EntityId> = program
            .steps()
            .flat_map(|(_, step)| step.references())
            .filter_map(|reference| reference.resolve(&*world))
            .collect();
        for object in objects {
            self.freeze(object, world);
        }
        debug!(
            "flow restriction: {} frozen, {} deferred",
            self.frozen_count(),
            self.retry.len()
        );
    }

    fn group_entered(&mut self, program: &Program, group: GroupCursor, world: &mut dyn World) {
        if !self.enabled {
            return;
        }
        self.exempt = Self::parallel_objects(program, group, &*world);
        let exempt: Vec<EntityId> = self.exempt.iter().copied().collect();
        for object in exempt {
            self.unfreeze(object, world);
        }
        self.retry_pending(world);
    }

    fn step_activated(
        &mut self,
        _program: &Program,
        _path: StepPath,
        resolved: Resolved,
        world: &mut dyn World,
    ) {
        if !self.enabled {
            return;
        }
        self.unfreeze(resolved.target, world);
        self.retry_pending(world);
    }

    fn step_completed(
        &mut self,
        program: &Program,
        path: StepPath,
        target: EntityId,
        world: &mut dyn World,
    ) {
        if !self.enabled {
            return;
        }
        if self.exempt.contains(&target) {
            trace!("{:?} exempt for the group", target);
        } else if Self::referenced_later(program, path, target, &*world) {
            debug!("{:?} still referenced, left unfrozen", target);
        } else {
            self.freeze(target, world);
        }
        self.retry_pending(world);
    }

    fn group_completed(&mut self, program: &Program, group: GroupCursor, world: &mut dyn World) {
        if !self.enabled {
            return;
        }
        let exempt: Vec<EntityId> = core::mem::take(&mut self.exempt).into_iter().collect();
        for object in exempt {
            if !Self::referenced_after_group(program, group, object, &*world) {
                self.freeze(object, world);
            }
        }
        self.retry_pending(world);
    }

    fn program_completed(&mut self, _program: &Program, world: &mut dyn World) {
        if !self.enabled {
            return;
        }
        self.release_all(world);
    }
}
