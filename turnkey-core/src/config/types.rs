//! Program model
//!
//! Programs are built by an external loader and handed to the engine
//! read-mostly: the engine only touches the completion flags, handlers only
//! read parameters. The hierarchy is heap-allocated; labels and lookup keys
//! are bounded strings.

use alloc::vec::Vec;
use heapless::String;

use super::reference::EntityReference;
use crate::rotation::{Axis, Direction};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum label length
pub const MAX_LABEL_LEN: usize = 32;

/// Maximum entity lookup key length
pub const MAX_KEY_LEN: usize = 64;

/// Maximum socket tags per filter
pub const MAX_TAGS: usize = 8;

/// Display label
pub type Label = String<MAX_LABEL_LEN>;

/// Copy `s` into a bounded string, truncating at a char boundary
pub fn bounded<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Kind of user action a step asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StepKind {
    Grab,
    GrabAndSnap,
    TurnKnob,
    TightenValve,
    LoosenValve,
    InstallValve,
    RemoveValve,
    TurnByCount,
    WaitForCondition,
    ShowInstruction,
    Teleport,
}

impl StepKind {
    /// Check if this kind drives the rotation lock
    pub fn is_valve(&self) -> bool {
        matches!(
            self,
            StepKind::InstallValve
                | StepKind::TightenValve
                | StepKind::LoosenValve
                | StepKind::RemoveValve
        )
    }

    /// Check if this kind tracks rotation without a socket
    pub fn is_knob(&self) -> bool {
        matches!(self, StepKind::TurnKnob | StepKind::TurnByCount)
    }

    /// Check if the step requires a destination reference
    pub fn needs_destination(&self) -> bool {
        matches!(self, StepKind::Teleport)
    }

    /// Short name for logs and reports
    pub fn name(&self) -> &'static str {
        match self {
            StepKind::Grab => "grab",
            StepKind::GrabAndSnap => "grab-and-snap",
            StepKind::TurnKnob => "turn-knob",
            StepKind::TightenValve => "tighten-valve",
            StepKind::LoosenValve => "loosen-valve",
            StepKind::InstallValve => "install-valve",
            StepKind::RemoveValve => "remove-valve",
            StepKind::TurnByCount => "turn-by-count",
            StepKind::WaitForCondition => "wait-for-condition",
            StepKind::ShowInstruction => "show-instruction",
            StepKind::Teleport => "teleport",
        }
    }
}

/// Numeric step parameters
///
/// `None` falls back to the object's profile.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StepParams {
    /// Rotation axis
    pub axis: Option<Axis>,
    /// Tighten / turn direction
    pub direction: Option<Direction>,
    /// Absolute knob target (degrees)
    pub target_angle_deg: Option<f32>,
    /// Full turns required (turn-by-count)
    pub turn_count: Option<f32>,
    /// Angular slack (degrees)
    pub tolerance_deg: Option<f32>,
    /// Valve tighten threshold (degrees)
    pub tighten_threshold_deg: Option<f32>,
    /// Valve loosen threshold (degrees)
    pub loosen_threshold_deg: Option<f32>,
}

/// Atomic unit of required user action
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Step {
    /// Display label
    pub label: Label,
    /// Step kind
    pub kind: StepKind,
    /// Object the user acts on
    pub target: EntityReference,
    /// Socket, anchor or teleport destination
    #[cfg_attr(feature = "serde", serde(default))]
    pub destination: Option<EntityReference>,
    /// Numeric parameters
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: StepParams,
    /// Keep the target interactable for the whole group
    #[cfg_attr(feature = "serde", serde(default))]
    pub allow_parallel: bool,
    /// Set by the engine once the step completed
    #[cfg_attr(feature = "serde", serde(skip))]
    pub is_completed: bool,
    /// Set by the engine when the step was skipped
    #[cfg_attr(feature = "serde", serde(skip))]
    pub skipped: bool,
}

impl Step {
    /// Step acting on `target`
    pub fn new(label: &str, kind: StepKind, target: EntityReference) -> Self {
        Self {
            label: bounded(label),
            kind,
            target,
            destination: None,
            params: StepParams::default(),
            allow_parallel: false,
            is_completed: false,
            skipped: false,
        }
    }

    /// Set the destination reference
    pub fn with_destination(mut self, destination: EntityReference) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Set numeric parameters
    pub fn with_params(mut self, params: StepParams) -> Self {
        self.params = params;
        self
    }

    /// Mark as parallel within its group
    pub fn parallel(mut self) -> Self {
        self.allow_parallel = true;
        self
    }

    /// Completed or skipped
    pub fn is_finished(&self) -> bool {
        self.is_completed || self.skipped
    }

    /// References this step holds, target first
    pub fn references(&self) -> impl Iterator<Item = &EntityReference> {
        core::iter::once(&self.target).chain(self.destination.as_ref())
    }
}

/// Ordered or unordered set of steps
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TaskGroup {
    /// Display label
    pub label: Label,
    /// Only one non-parallel step active at a time
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub enforce_sequential_flow: bool,
    /// Steps in order
    pub steps: Vec<Step>,
}

#[cfg(feature = "serde")]
fn default_true() -> bool {
    true
}

impl TaskGroup {
    /// Sequential group
    pub fn sequential(label: &str, steps: Vec<Step>) -> Self {
        Self {
            label: bounded(label),
            enforce_sequential_flow: true,
            steps,
        }
    }

    /// Unordered group
    pub fn unordered(label: &str, steps: Vec<Step>) -> Self {
        Self {
            label: bounded(label),
            enforce_sequential_flow: false,
            steps,
        }
    }

    /// Check if every addressable step completed or was skipped
    pub fn is_finished(&self) -> bool {
        indexed(&self.steps).all(|(_, step)| step.is_finished())
    }
}

/// Named grouping of task groups
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Module {
    /// Display label
    pub label: Label,
    /// Task groups in order
    pub groups: Vec<TaskGroup>,
}

impl Module {
    pub fn new(label: &str, groups: Vec<TaskGroup>) -> Self {
        Self {
            label: bounded(label),
            groups,
        }
    }
}

/// Position of a step in the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StepPath {
    pub module: u16,
    pub group: u16,
    pub step: u16,
}

impl StepPath {
    pub const fn new(module: u16, group: u16, step: u16) -> Self {
        Self {
            module,
            group,
            step,
        }
    }

    /// Group containing this step
    pub const fn group_cursor(&self) -> GroupCursor {
        GroupCursor {
            module: self.module,
            group: self.group,
        }
    }
}

/// Position of a task group in the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupCursor {
    pub module: u16,
    pub group: u16,
}

impl GroupCursor {
    /// Path of step `step` in this group
    pub const fn step(&self, step: u16) -> StepPath {
        StepPath::new(self.module, self.group, step)
    }
}

/// Items with their index, up to the last index that fits a path component
pub(crate) fn indexed<T>(items: &[T]) -> impl Iterator<Item = (u16, &T)> {
    items
        .iter()
        .enumerate()
        .map_while(|(i, item)| Some((u16::try_from(i).ok()?, item)))
}

/// Root of a training run
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Program {
    /// Display label
    pub label: Label,
    /// Modules in order
    pub modules: Vec<Module>,
}

impl Program {
    pub fn new(label: &str, modules: Vec<Module>) -> Self {
        Self {
            label: bounded(label),
            modules,
        }
    }

    /// Task group at `cursor`
    pub fn group(&self, cursor: GroupCursor) -> Option<&TaskGroup> {
        self.modules
            .get(usize::from(cursor.module))?
            .groups
            .get(usize::from(cursor.group))
    }

    /// Step at `path`
    pub fn step(&self, path: StepPath) -> Option<&Step> {
        self.group(path.group_cursor())?
            .steps
            .get(usize::from(path.step))
    }

    /// Mutable step at `path`
    pub fn step_mut(&mut self, path: StepPath) -> Option<&mut Step> {
        self.modules
            .get_mut(usize::from(path.module))?
            .groups
            .get_mut(usize::from(path.group))?
            .steps
            .get_mut(usize::from(path.step))
    }

    /// Every step with its path, in program order
    ///
    /// Steps whose indices do not fit a [`StepPath`] are not addressable
    /// and are left out.
    pub fn steps(&self) -> impl Iterator<Item = (StepPath, &Step)> {
        indexed(&self.modules).flat_map(|(m, module)| {
            indexed(&module.groups).flat_map(move |(g, group)| {
                indexed(&group.steps).map(move |(s, step)| (StepPath::new(m, g, s), step))
            })
        })
    }

    /// Total step count
    pub fn total_steps(&self) -> usize {
        self.steps().count()
    }

    /// First group holding at least one step
    pub fn first_group(&self) -> Option<GroupCursor> {
        self.groups_from(GroupCursor { module: 0, group: 0 })
    }

    /// Next non-empty group after `cursor`
    pub fn next_group(&self, cursor: GroupCursor) -> Option<GroupCursor> {
        let next = GroupCursor {
            module: cursor.module,
            group: cursor.group.checked_add(1)?,
        };
        self.groups_from(next)
    }

    fn groups_from(&self, start: GroupCursor) -> Option<GroupCursor> {
        let mut module = usize::from(start.module);
        let mut group = usize::from(start.group);
        while let Some(m) = self.modules.get(module) {
            while let Some(g) = m.groups.get(group) {
                if !g.steps.is_empty() {
                    return Some(GroupCursor {
                        module: u16::try_from(module).ok()?,
                        group: u16::try_from(group).ok()?,
                    });
                }
                group += 1;
            }
            module += 1;
            group = 0;
        }
        None
    }

    /// Unfinished steps other than `path` in its group and every later group
    pub fn remaining_after(&self, path: StepPath) -> impl Iterator<Item = (StepPath, &Step)> {
        let cursor = path.group_cursor();
        self.steps().filter(move |(p, step)| {
            *p != path && p.group_cursor() >= cursor && !step.is_finished()
        })
    }

    /// Clear completion flags and cached lookups
    pub fn reset_progress(&mut self) {
        for module in &mut self.modules {
            for group in &mut module.groups {
                for step in &mut group.steps {
                    step.is_completed = false;
                    step.skipped = false;
                    step.target.clear_cache();
                    if let Some(destination) = step.destination.as_mut() {
                        destination.clear_cache();
                    }
                }
            }
        }
    }
}
