//! Training session
//!
//! A [`Session`] is the context object for one run: it owns the host
//! integration, the engine with its handlers, the flow restriction manager
//! and the completion sink. Hosts call [`Session::tick`] once per frame and
//! [`Session::interaction`] for every interaction event.

use std::mem;
use std::path::Path;

use tracing::{debug, info, warn};
use turnkey_core::config::{Program, StepPath};
use turnkey_core::restriction::FlowRestriction;
use turnkey_core::sequence::{
    EnginePhase, HandlerRegistry, Progress, RunContext, SequenceEngine, SequenceEvent,
    StepOutcome, StepReport,
};
use turnkey_core::traits::{InteractionEvent, World};

use crate::config::{self, RuntimeConfig};
use crate::error::Result;
use crate::scene::Scene;

/// Receives every finished step
///
/// `reason` is the handler's completion reason, or `skipped: <code>` when
/// the step could not run.
pub trait CompletionSink {
    fn report_step_complete(&mut self, report: &StepReport, reason: &str);
}

impl<F> CompletionSink for F
where
    F: FnMut(&StepReport, &str),
{
    fn report_step_complete(&mut self, report: &StepReport, reason: &str) {
        self(report, reason)
    }
}

/// One training run over one host world
pub struct Session<W: World> {
    scene: Scene<W>,
    engine: SequenceEngine,
    flow: FlowRestriction,
    sink: Option<Box<dyn CompletionSink>>,
    events: Vec<SequenceEvent>,
}

impl<W: World> Session<W> {
    /// Session with the stock handlers
    pub fn new(world: W, config: &RuntimeConfig) -> Self {
        let registry = turnkey_handlers::default_registry(&config.profiles);
        Self::with_registry(world, config, registry)
    }

    /// Session with a custom handler set
    pub fn with_registry(world: W, config: &RuntimeConfig, registry: HandlerRegistry) -> Self {
        debug!(
            "session: {} handler(s), restrict_flow={}",
            registry.len(),
            config.session.restrict_flow
        );
        Self {
            scene: Scene::new(world, config.session.design_time),
            engine: SequenceEngine::new(registry),
            flow: FlowRestriction::new(config.session.restrict_flow),
            sink: None,
            events: Vec::new(),
        }
    }

    /// Session configured from the file at `path`, on defaults if it is
    /// missing
    pub fn from_config_file(world: W, path: impl AsRef<Path>) -> Self {
        let config = config::load_or_default(path);
        Self::new(world, &config)
    }

    /// Attach the completion sink
    pub fn with_sink(mut self, sink: impl CompletionSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn world(&self) -> &W {
        self.scene.get()
    }

    pub fn world_mut(&mut self) -> &mut W {
        self.scene.get_mut()
    }

    pub fn engine(&self) -> &SequenceEngine {
        &self.engine
    }

    pub fn flow(&self) -> &FlowRestriction {
        &self.flow
    }

    pub fn phase(&self) -> EnginePhase {
        self.engine.phase()
    }

    pub fn progress(&self) -> Progress {
        self.engine.progress()
    }

    /// Start `program`
    pub fn start(&mut self, program: Program) -> Result<()> {
        info!(
            "starting '{}' ({} steps)",
            program.label.as_str(),
            program.total_steps()
        );
        self.run(|engine, cx| engine.start(program, cx))?;
        Ok(())
    }

    /// Per-frame update
    pub fn tick(&mut self) {
        self.run(|engine, cx| engine.tick(cx));
    }

    /// Route an interaction event
    pub fn interaction(&mut self, event: InteractionEvent) {
        self.run(|engine, cx| engine.handle_interaction(&event, cx));
    }

    /// Force-complete the gating step(s)
    pub fn advance(&mut self) -> Result<()> {
        self.run(|engine, cx| engine.advance(cx))?;
        Ok(())
    }

    /// Complete one active step from outside (host tooling)
    pub fn complete_step(&mut self, path: StepPath, reason: &'static str) -> Result<()> {
        self.run(|engine, cx| engine.complete_step(path, reason, cx))?;
        Ok(())
    }

    /// Stop the run, restoring every body and socket
    pub fn abort(&mut self) -> Result<()> {
        self.run(|engine, cx| engine.abort(cx))?;
        Ok(())
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<SequenceEvent> {
        mem::take(&mut self.events)
    }

    /// End the session and hand the host integration back
    pub fn into_world(self) -> W {
        self.scene.into_inner()
    }

    fn run<T>(&mut self, op: impl FnOnce(&mut SequenceEngine, &mut RunContext<'_>) -> T) -> T {
        let mut cx = RunContext::new(&mut self.scene, &mut self.flow);
        let out = op(&mut self.engine, &mut cx);
        self.collect();
        out
    }

    /// Pull engine events, feeding finished steps to the sink
    fn collect(&mut self) {
        for event in self.engine.drain_events() {
            match &event {
                SequenceEvent::StepFinished(report) => self.forward(report),
                SequenceEvent::Notice(notice) => {
                    debug!("notice for {:?}: {}", notice.object, notice.kind);
                }
                SequenceEvent::ProgramCompleted => info!("program complete"),
                SequenceEvent::ProgramAborted => warn!("program aborted"),
                _ => {}
            }
            self.events.push(event);
        }
    }

    fn forward(&mut self, report: &StepReport) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        match report.outcome {
            StepOutcome::Completed { reason } => sink.report_step_complete(report, reason),
            StepOutcome::Skipped(error) => {
                let reason = format!("skipped: {}", error.code());
                sink.report_step_complete(report, &reason);
            }
        }
    }
}
