//! In-process session replay
//!
//! Wires one [`Recorder`] per frame and a [`RecordingController`] in the host
//! through in-memory ports, then plays a [`Session`] script against them on a
//! [`ManualClock`]. Timers fire at their exact due instants, so a replay is
//! fully deterministic.

use super::session::{Action, Session, Step, StepTarget};
use crate::app::config::Config;
use crate::capture::recorder::Recorder;
use crate::capture::trace::Trace;
use crate::codegen::SynthesisOptions;
use crate::controller::{MemoryPresenter, Notice, RecordingController};
use crate::dom::{DomEvent, DomTree, EventOutcome};
use crate::protocol::{FrameId, MemoryFrames, MemoryPort, Message};
use crate::time::{Clock, ManualClock};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Upper bound on timer rounds after the script ends
const MAX_SETTLE_ROUNDS: usize = 10_000;

/// What a replay produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayOutcome {
    pub generated_test: Option<String>,
    pub trace: Option<Trace>,
    pub notices: Vec<Notice>,
    pub frame_messages: Vec<Message>,
    pub steps: usize,
}

struct FrameRuntime {
    id: FrameId,
    inbox: MemoryPort,
    outbox: MemoryPort,
    recorder: Recorder<DomTree, MemoryPort>,
}

/// Replay driver
pub struct Replay {
    clock: ManualClock,
    start_at: u64,
    frames: Vec<FrameRuntime>,
    controller: RecordingController<DomTree, MemoryFrames>,
    presenter: MemoryPresenter,
    script: Vec<Step>,
}

impl Replay {
    pub fn new(session: Session, config: &Config) -> crate::Result<Self> {
        session.validate()?;
        config.validate()?;

        let start_at = session.metadata.start_at;
        let clock = ManualClock::new(start_at);
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());

        let mut registry = MemoryFrames::new();
        let mut frames = Vec::with_capacity(session.frames.len());
        for frame in session.frames {
            let (id, inbox) = registry.add_frame();
            let outbox = MemoryPort::new();
            if frame.detached {
                outbox.close();
            }
            let recorder = Recorder::new(
                frame.document,
                outbox.clone(),
                shared.clone(),
                config.recorder.clone(),
            );
            frames.push(FrameRuntime {
                id,
                inbox,
                outbox,
                recorder,
            });
        }

        let presenter = MemoryPresenter::new();
        let mut controller =
            RecordingController::new(session.host, registry, shared, config.controller.clone())
                .with_presenter(presenter.clone())
                .with_synthesis(SynthesisOptions::from(&config.synthesizer));
        if let Some(url) = session.metadata.target_url {
            controller = controller.with_target_url(url);
        }

        let mut script = session.script;
        script.sort_by_key(|step| step.at);

        Ok(Self {
            clock,
            start_at,
            frames,
            controller,
            presenter,
            script,
        })
    }

    /// Play the whole script and collect the result
    pub fn run(mut self) -> ReplayOutcome {
        let script = std::mem::take(&mut self.script);
        info!(steps = script.len(), frames = self.frames.len(), "Replaying session");

        self.pump();
        for step in &script {
            self.advance_to(self.start_at + step.at);
            self.apply(step);
            self.pump();
        }

        if self.controller.is_recording() {
            info!("Script ended while recording; stopping");
            self.controller.stop_recording();
            self.pump();
        }
        self.settle();

        ReplayOutcome {
            generated_test: self.controller.generated_test().map(str::to_string),
            trace: self.controller.last_trace().cloned(),
            notices: self.presenter.notices(),
            frame_messages: self.presenter.frame_messages(),
            steps: script.len(),
        }
    }

    fn next_due(&self) -> Option<u64> {
        self.frames
            .iter()
            .filter_map(|f| f.recorder.next_timer_due())
            .chain(self.controller.next_timer_due())
            .min()
    }

    /// Move the clock to `target`, firing every timer due on the way at its own instant
    fn advance_to(&mut self, target: u64) {
        while let Some(due) = self.next_due().filter(|due| *due <= target) {
            self.clock.set(due);
            self.pump();
        }
        self.clock.set(target);
    }

    fn settle(&mut self) {
        for _ in 0..MAX_SETTLE_ROUNDS {
            let Some(due) = self.next_due() else { return };
            self.clock.set(due);
            self.pump();
        }
        warn!("Timers still pending after settling; giving up");
    }

    /// Deliver queued messages and due timers until nothing moves
    fn pump(&mut self) {
        loop {
            let mut moved = false;

            for frame in &mut self.frames {
                for message in frame.inbox.drain() {
                    frame.recorder.handle_message(&message);
                    moved = true;
                }
                frame.recorder.run_due_timers();
            }
            self.controller.poll();

            for frame in &self.frames {
                for message in frame.outbox.drain() {
                    self.controller.on_message(frame.id, &message);
                    moved = true;
                }
            }

            if !moved {
                break;
            }
        }
    }

    fn document_mut(&mut self, target: StepTarget) -> Option<&mut DomTree> {
        match target {
            StepTarget::Host => Some(self.controller.document_mut()),
            StepTarget::Frame(index) => self
                .frames
                .get_mut(index as usize)
                .map(|f| f.recorder.document_mut()),
        }
    }

    fn dispatch(&mut self, target: StepTarget, event: &DomEvent) {
        let outcome = match target {
            StepTarget::Host => self.controller.handle_host_event(event),
            StepTarget::Frame(index) => match self.frames.get_mut(index as usize) {
                Some(frame) => frame.recorder.handle_event(event),
                None => {
                    warn!(frame = index, "Event for missing frame dropped");
                    return;
                }
            },
        };
        if outcome == EventOutcome::PreventDefault {
            debug!(event = event.name(), ?target, "Default action prevented");
        }
    }

    fn apply(&mut self, step: &Step) {
        match &step.action {
            Action::Toggle => self.controller.toggle_recording(),
            Action::EnableSelection => self.controller.enable_selection(),
            Action::DisableSelection => self.controller.disable_selection(),
            Action::Dispatch { event } => self.dispatch(step.target, event),
            Action::Append { parent, element } => {
                let Some(doc) = self.document_mut(step.target) else { return };
                let id = doc.append(*parent, element.clone());
                self.dispatch(step.target, &DomEvent::NodesAdded { nodes: vec![id] });
            }
            action => {
                let Some(doc) = self.document_mut(step.target) else { return };
                match action {
                    Action::SetValue { node, value } => doc.set_value(*node, value),
                    Action::Focus { node } => doc.focus(*node),
                    Action::SelectText { node, text } => doc.select_text(*node, text),
                    Action::Navigate { url } => doc.navigate(url),
                    _ => {}
                }
            }
        }
    }
}

/// Replay `session` with `config` and return the outcome
pub fn replay_session(session: Session, config: &Config) -> crate::Result<ReplayOutcome> {
    Ok(Replay::new(session, config)?.run())
}
