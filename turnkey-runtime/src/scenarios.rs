//! End-to-end runs through a session over the mock world

use std::cell::RefCell;
use std::rc::Rc;

use turnkey_core::config::{
    EntityReference, Module, Program, Step, StepKind, StepParams, StepPath, TaskGroup,
};
use turnkey_core::mock::MockWorld;
use turnkey_core::rotation::{Axis, Direction};
use turnkey_core::sequence::{EnginePhase, SequenceEvent, StepReport};
use turnkey_core::traits::{AgentId, BodyConstraints, EntityId, InteractionEvent};

use crate::config::{parse_config, RuntimeConfig};
use crate::session::{CompletionSink, Session};

#[derive(Clone, Default)]
struct Journal(Rc<RefCell<Vec<(String, String)>>>);

impl Journal {
    fn reasons(&self) -> Vec<String> {
        self.0.borrow().iter().map(|(_, reason)| reason.clone()).collect()
    }

    fn labels(&self) -> Vec<String> {
        self.0.borrow().iter().map(|(label, _)| label.clone()).collect()
    }
}

impl CompletionSink for Journal {
    fn report_step_complete(&mut self, report: &StepReport, reason: &str) {
        self.0
            .borrow_mut()
            .push((report.label.as_str().to_owned(), reason.to_owned()));
    }
}

fn on(key: &str) -> EntityReference {
    EntityReference::by_key(key)
}

fn program(groups: Vec<TaskGroup>) -> Program {
    Program::new("drill", vec![Module::new("main", groups)])
}

fn session(world: MockWorld, config: &RuntimeConfig) -> (Session<MockWorld>, Journal) {
    let journal = Journal::default();
    let session = Session::new(world, config).with_sink(journal.clone());
    (session, journal)
}

fn turn(session: &mut Session<MockWorld>, object: EntityId, delta: f32) {
    session.world_mut().rotate(object, Axis::Y, delta);
    session.tick();
}

#[test]
fn test_valve_lifecycle_with_flow_restriction() {
    let mut world = MockWorld::new();
    let valve = world.spawn("valve");
    let flange = world.spawn_socket("flange", &["dn50"]);
    let wrench = world.spawn("wrench");

    let valve_step = |label: &str, kind| {
        Step::new(label, kind, on("valve")).with_destination(on("flange"))
    };
    let drill = program(vec![
        TaskGroup::sequential(
            "service",
            vec![
                valve_step("install", StepKind::InstallValve),
                valve_step("tighten", StepKind::TightenValve),
                valve_step("loosen", StepKind::LoosenValve),
                valve_step("remove", StepKind::RemoveValve),
            ],
        ),
        TaskGroup::sequential("stow", vec![Step::new("stow", StepKind::Grab, on("wrench"))]),
    ]);

    let (mut session, journal) = session(world, &RuntimeConfig::default());
    session.start(drill).unwrap();
    assert_eq!(session.world().constraints_of(valve), Some(BodyConstraints::FREE));
    assert_eq!(session.world().constraints_of(wrench), Some(BodyConstraints::FROZEN));

    session.interaction(InteractionEvent::PlacedInSocket {
        object: valve,
        socket: flange,
    });
    assert!(!session.world().capture_enabled(flange));
    assert_eq!(
        session.world().constraints_of(valve),
        Some(BodyConstraints::rotate_only(Axis::Y))
    );

    turn(&mut session, valve, 45.0);
    assert_eq!(journal.reasons(), ["snapped"]);
    turn(&mut session, valve, 45.0);
    assert_eq!(journal.reasons(), ["snapped", "tightened"]);

    turn(&mut session, valve, -45.0);
    turn(&mut session, valve, -45.0);
    assert_eq!(journal.reasons(), ["snapped", "tightened", "loosened"]);
    assert!(session.world().capture_enabled(flange));
    assert_eq!(session.world().constraints_of(valve), Some(BodyConstraints::FREE));

    session.interaction(InteractionEvent::RemovedFromSocket {
        object: valve,
        socket: flange,
    });
    // Not referenced by anything left, so the valve is parked again
    assert_eq!(session.world().constraints_of(valve), Some(BodyConstraints::FROZEN));
    assert_eq!(session.world().constraints_of(wrench), Some(BodyConstraints::FREE));

    session.interaction(InteractionEvent::Grabbed {
        object: wrench,
        agent: AgentId(1),
    });
    assert_eq!(
        journal.reasons(),
        ["snapped", "tightened", "loosened", "removed", "grabbed"]
    );
    assert_eq!(session.phase(), EnginePhase::Complete);
    assert_eq!(session.world().constraints_of(valve), Some(BodyConstraints::FREE));
    assert_eq!(session.world().constraints_of(wrench), Some(BodyConstraints::FREE));
    assert_eq!(session.flow().frozen_count(), 0);

    let events = session.drain_events();
    assert_eq!(events.last(), Some(&SequenceEvent::ProgramCompleted));
}

#[test]
fn test_turn_by_count() {
    let mut world = MockWorld::new();
    let wheel = world.spawn("handwheel");
    let params = StepParams {
        turn_count: Some(2.0),
        direction: Some(Direction::Clockwise),
        tolerance_deg: Some(5.0),
        ..StepParams::default()
    };
    let drill = program(vec![TaskGroup::sequential(
        "open",
        vec![Step::new("open", StepKind::TurnByCount, on("handwheel")).with_params(params)],
    )]);

    let (mut session, journal) = session(world, &RuntimeConfig::default());
    session.start(drill).unwrap();
    for _ in 0..23 {
        turn(&mut session, wheel, 30.0);
    }
    assert!(journal.reasons().is_empty());
    assert_eq!(session.progress().active, 1);

    turn(&mut session, wheel, 30.0);
    assert_eq!(journal.reasons(), ["turns-reached"]);
    assert_eq!(session.progress().completed, 1);
    assert_eq!(session.phase(), EnginePhase::Complete);
}

#[test]
fn test_skipped_step_reaches_sink() {
    let mut world = MockWorld::new();
    let panel = world.spawn_static("panel");
    let drill = program(vec![TaskGroup::sequential(
        "brief",
        vec![
            Step::new("ghost", StepKind::Grab, on("ghost")),
            Step::new("read", StepKind::ShowInstruction, on("panel")),
        ],
    )]);

    let (mut session, journal) = session(world, &RuntimeConfig::default());
    session.start(drill).unwrap();
    assert_eq!(journal.reasons(), ["skipped: unresolved-reference"]);

    session.interaction(InteractionEvent::Activated { object: panel });
    assert_eq!(journal.labels(), ["ghost", "read"]);
    assert_eq!(journal.reasons()[1], "acknowledged");
    assert_eq!(session.progress().skipped, 1);
}

#[test]
fn test_condition_and_teleport() {
    let mut world = MockWorld::new();
    let gauge = world.spawn_static("gauge");
    world.spawn_static("trainee");
    let pad = world.spawn_static("pad");
    let drill = program(vec![TaskGroup::sequential(
        "pressurize",
        vec![
            Step::new("wait", StepKind::WaitForCondition, on("gauge")),
            Step::new("go", StepKind::Teleport, on("trainee")).with_destination(on("pad")),
        ],
    )]);

    let (mut session, journal) = session(world, &RuntimeConfig::default());
    session.start(drill).unwrap();
    session.tick();
    assert!(journal.reasons().is_empty());

    session.world_mut().satisfy(gauge, true);
    session.tick();
    assert_eq!(journal.reasons(), ["condition-met"]);

    session.interaction(InteractionEvent::Teleported {
        agent: AgentId(1),
        destination: pad,
    });
    assert_eq!(journal.reasons(), ["condition-met", "arrived"]);
}

#[test]
fn test_flow_restriction_disabled_by_config() {
    let config = parse_config("[session]\nrestrict_flow = false").unwrap();
    let mut world = MockWorld::new();
    world.spawn("first");
    let second = world.spawn("second");
    let drill = program(vec![TaskGroup::sequential(
        "pick",
        vec![
            Step::new("first", StepKind::Grab, on("first")),
            Step::new("second", StepKind::Grab, on("second")),
        ],
    )]);

    let (mut session, _journal) = session(world, &config);
    session.start(drill).unwrap();
    assert_eq!(session.world().writes_for(second), 0);
    assert!(!session.flow().is_enabled());
}

#[test]
fn test_abort_releases_everything() {
    let mut world = MockWorld::new();
    let first = world.spawn("first");
    let second = world.spawn("second");
    let drill = program(vec![TaskGroup::sequential(
        "pick",
        vec![
            Step::new("first", StepKind::Grab, on("first")),
            Step::new("second", StepKind::Grab, on("second")),
        ],
    )]);

    let (mut session, journal) = session(world, &RuntimeConfig::default());
    session.start(drill).unwrap();
    assert_eq!(session.world().constraints_of(second), Some(BodyConstraints::FROZEN));

    session.abort().unwrap();
    assert_eq!(session.phase(), EnginePhase::Idle);
    assert_eq!(session.world().constraints_of(first), Some(BodyConstraints::FREE));
    assert_eq!(session.world().constraints_of(second), Some(BodyConstraints::FREE));
    assert!(journal.reasons().is_empty());
    assert!(session.drain_events().contains(&SequenceEvent::ProgramAborted));
    assert!(session.abort().is_err());
}

#[test]
fn test_advance_and_external_completion() {
    let mut world = MockWorld::new();
    world.spawn("first");
    world.spawn("second");
    let drill = program(vec![TaskGroup::sequential(
        "pick",
        vec![
            Step::new("first", StepKind::Grab, on("first")),
            Step::new("second", StepKind::Grab, on("second")),
        ],
    )]);

    let (mut session, journal) = session(world, &RuntimeConfig::default());
    session.start(drill).unwrap();
    session.advance().unwrap();
    assert_eq!(journal.reasons(), ["advanced"]);

    let second = StepPath::new(0, 0, 1);
    assert!(session.engine().is_active(second));
    session.complete_step(second, "operator").unwrap();
    assert_eq!(journal.reasons(), ["advanced", "operator"]);
    assert!(session.complete_step(second, "operator").is_err());
}
