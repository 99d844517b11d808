//! Host-side recording controller
//!
//! Drives recording on every embedded frame, captures clicks and inputs that
//! happen in the host document itself, merges both streams once a frame
//! answers and hands the result to the synthesizer. When no frame answers in
//! time the host data alone is used.

pub mod host_selector;
pub mod presenter;

pub use host_selector::{host_click_selector, host_input_selector, in_toolbar};
pub use presenter::{
    Clipboard, MemoryClipboard, MemoryPresenter, Notice, NoticeLevel, Presenter,
    TracingPresenter, UnavailableClipboard,
};

use crate::app::config::ControllerConfig;
use crate::capture::trace::{ClickDetail, InputAction, InputChange, Trace, UserInfo};
use crate::codegen::{generate_playwright_test_with, SynthesisOptions};
use crate::dom::{Document, DomEvent, EventOutcome, NodeId};
use crate::protocol::{FrameId, FrameSet, Message};
use crate::time::{Clock, TimerQueue};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Recording,
    AwaitingResults,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ControllerTimer {
    HostInput(String),
    ResultsTimeout,
}

#[derive(Debug, Clone)]
struct PendingHostInput {
    target: NodeId,
    selector: String,
}

/// Recording controller living in the host document
pub struct RecordingController<D: Document, F: FrameSet> {
    document: D,
    frames: F,
    clock: Arc<dyn Clock>,
    config: ControllerConfig,
    synthesis: SynthesisOptions,
    presenter: Box<dyn Presenter>,
    clipboard: Box<dyn Clipboard>,
    target_url: Option<String>,

    state: ControllerState,
    session_id: Option<Uuid>,
    started_at: u64,
    host_clicks: Vec<ClickDetail>,
    host_inputs: Vec<InputChange>,
    pending_inputs: BTreeMap<String, PendingHostInput>,
    timers: TimerQueue<ControllerTimer>,

    last_trace: Option<Trace>,
    generated: Option<String>,
}

impl<D: Document, F: FrameSet> RecordingController<D, F> {
    pub fn new(document: D, frames: F, clock: Arc<dyn Clock>, config: ControllerConfig) -> Self {
        Self {
            document,
            frames,
            clock,
            config,
            synthesis: SynthesisOptions::default(),
            presenter: Box::new(TracingPresenter),
            clipboard: Box::new(UnavailableClipboard),
            target_url: None,
            state: ControllerState::Idle,
            session_id: None,
            started_at: 0,
            host_clicks: Vec::new(),
            host_inputs: Vec::new(),
            pending_inputs: BTreeMap::new(),
            timers: TimerQueue::new(),
            last_trace: None,
            generated: None,
        }
    }

    pub fn with_presenter(mut self, presenter: impl Presenter + 'static) -> Self {
        self.presenter = Box::new(presenter);
        self
    }

    pub fn with_clipboard(mut self, clipboard: impl Clipboard + 'static) -> Self {
        self.clipboard = Box::new(clipboard);
        self
    }

    pub fn with_synthesis(mut self, options: SynthesisOptions) -> Self {
        self.synthesis = options;
        self
    }

    /// URL navigated to by generated tests; defaults to the host document's URL
    pub fn with_target_url(mut self, url: impl Into<String>) -> Self {
        self.target_url = Some(url.into());
        self
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == ControllerState::Recording
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn frames(&self) -> &F {
        &self.frames
    }

    /// Clicks captured in the host document during the current session
    pub fn host_clicks(&self) -> &[ClickDetail] {
        &self.host_clicks
    }

    /// Inputs captured in the host document during the current session
    pub fn host_inputs(&self) -> &[InputChange] {
        &self.host_inputs
    }

    /// Trace the last test was generated from
    pub fn last_trace(&self) -> Option<&Trace> {
        self.last_trace.as_ref()
    }

    pub fn generated_test(&self) -> Option<&str> {
        self.generated.as_deref()
    }

    pub fn next_timer_due(&self) -> Option<u64> {
        self.timers.next_due()
    }

    /// Idle → recording → awaiting results
    pub fn toggle_recording(&mut self) {
        self.poll();
        match self.state {
            ControllerState::Idle => self.begin(),
            ControllerState::Recording => self.end(),
            ControllerState::AwaitingResults => {
                warn!(session = ?self.session_id, "Toggle ignored while awaiting results");
            }
        }
    }

    pub fn start_recording(&mut self) {
        if self.state == ControllerState::Idle {
            self.toggle_recording();
        }
    }

    pub fn stop_recording(&mut self) {
        if self.state == ControllerState::Recording {
            self.toggle_recording();
        }
    }

    /// Ask every frame to turn text selections into assertions
    pub fn enable_selection(&mut self) {
        self.broadcast(&Message::EnableSelection);
    }

    pub fn disable_selection(&mut self) {
        self.broadcast(&Message::DisableSelection);
    }

    fn begin(&mut self) {
        let now = self.clock.now_ms();
        let session = Uuid::new_v4();
        self.session_id = Some(session);
        self.started_at = now;
        self.host_clicks.clear();
        self.host_inputs.clear();
        self.pending_inputs.clear();
        self.timers.clear();
        self.generated = None;
        self.state = ControllerState::Recording;

        let frames = self.frames.frame_ids().len();
        if frames == 0 {
            info!(%session, "No embedded frames; recording host events only");
        }
        self.broadcast(&Message::Start);

        info!(%session, frames, started_at = now, "Recording started");
        self.presenter.notify(Notice::info("Recording started"));
    }

    fn end(&mut self) {
        let now = self.clock.now_ms();
        self.flush_host_inputs(now);
        self.broadcast(&Message::Stop);

        self.state = ControllerState::AwaitingResults;
        self.timers.schedule(
            ControllerTimer::ResultsTimeout,
            now + self.config.results_timeout_ms,
        );
        info!(
            session = ?self.session_id,
            host_clicks = self.host_clicks.len(),
            host_inputs = self.host_inputs.len(),
            "Recording stopped, awaiting results"
        );
    }

    fn broadcast(&self, message: &Message) {
        for frame in self.frames.frame_ids() {
            if let Err(e) = self.frames.post_to_frame(frame, message) {
                warn!(%frame, kind = message.kind(), error = %e, "Failed to post to frame");
                self.presenter.notify(Notice::error(format!(
                    "Could not reach {}: {}",
                    frame, e
                )));
            }
        }
    }

    /// Capturing-phase listener on the host document
    pub fn handle_host_event(&mut self, event: &DomEvent) -> EventOutcome {
        self.poll();
        if !self.is_recording() {
            return EventOutcome::Continue;
        }
        let now = self.clock.now_ms();

        match event {
            DomEvent::Click { target, x, y } => {
                if in_toolbar(&self.document, *target, &self.config.toolbar_class) {
                    debug!("Toolbar click not recorded");
                    return EventOutcome::Continue;
                }
                let selector = host_click_selector(&self.document, *target);
                debug!(%selector, at = now, "Host click");
                self.host_clicks.push(ClickDetail::new(*x, *y, selector, now));
            }
            DomEvent::Input { target } | DomEvent::Change { target } => {
                self.on_host_input(*target, now);
            }
            _ => {}
        }
        EventOutcome::Continue
    }

    fn on_host_input(&mut self, target: NodeId, now: u64) {
        if in_toolbar(&self.document, target, &self.config.toolbar_class) {
            return;
        }
        let selector = host_input_selector(&self.document, target);
        let key = self
            .document
            .element(target)
            .and_then(|el| el.element_id())
            .map(str::to_string)
            .unwrap_or_else(|| selector.clone());

        self.pending_inputs
            .insert(key.clone(), PendingHostInput { target, selector });
        self.timers.reschedule(
            ControllerTimer::HostInput(key),
            now + self.config.host_input_debounce_ms,
        );
    }

    fn commit_host_input(&mut self, pending: PendingHostInput, timestamp: u64) {
        let value = self
            .document
            .element(pending.target)
            .map(|el| el.current_value().to_string())
            .unwrap_or_default();
        debug!(selector = %pending.selector, at = timestamp, "Host input");
        self.host_inputs.push(InputChange::new(
            pending.selector,
            value,
            timestamp,
            InputAction::Complete,
        ));
    }

    fn flush_host_inputs(&mut self, now: u64) {
        let drained = self
            .timers
            .drain_matching(|t| matches!(t, ControllerTimer::HostInput(_)));
        for timer in drained {
            if let ControllerTimer::HostInput(key) = timer {
                if let Some(pending) = self.pending_inputs.remove(&key) {
                    self.commit_host_input(pending, now);
                }
            }
        }
        self.pending_inputs.clear();
    }

    /// Fire due timers: host input debounces and the results timeout
    pub fn poll(&mut self) {
        let now = self.clock.now_ms();
        while let Some((due_at, timer)) = self.timers.pop_due(now) {
            match timer {
                ControllerTimer::HostInput(key) => {
                    if let Some(pending) = self.pending_inputs.remove(&key) {
                        self.commit_host_input(pending, due_at);
                    }
                }
                ControllerTimer::ResultsTimeout => self.on_results_timeout(due_at),
            }
        }
    }

    fn on_results_timeout(&mut self, now: u64) {
        if self.state != ControllerState::AwaitingResults {
            return;
        }

        let trace = if self.host_clicks.is_empty() && self.host_inputs.is_empty() {
            warn!(session = ?self.session_id, "No results and no host events; generating empty test");
            Trace::default()
        } else {
            warn!(
                session = ?self.session_id,
                host_clicks = self.host_clicks.len(),
                "No frame answered; generating from host events"
            );
            let mut trace = Trace::started_at(self.started_at);
            trace.user_info = UserInfo {
                window_size: self.document.window_size(),
                user_agent: self.document.user_agent(),
                platform: self.document.platform(),
            };
            trace.time.stop_time = now;
            trace.time.current_time = now;
            trace.clicks.extend(self.host_clicks.iter().cloned());
            trace.input_changes.extend(self.host_inputs.iter().cloned());
            trace
        };

        self.presenter.notify(Notice::warning(
            "No recording results received from the page; using what the host captured",
        ));
        self.finish(trace);
    }

    /// Handle a message posted by a frame
    pub fn on_message(&mut self, from: FrameId, message: &Message) {
        self.poll();
        match message {
            Message::Results { data } => {
                if self.state != ControllerState::AwaitingResults {
                    debug!(%from, state = ?self.state, "Results ignored");
                    return;
                }
                let merged = self.merge(data);
                info!(
                    %from,
                    clicks = merged.clicks.count(),
                    inputs = merged.input_changes.len(),
                    "Results received"
                );
                self.finish(merged);
            }
            Message::Setup { .. }
            | Message::Selection { .. }
            | Message::ShowPopup { .. }
            | Message::SelectionModeEnded => {
                debug!(%from, kind = message.kind(), "Frame message");
                self.presenter.frame_message(message);
            }
            other => debug!(%from, kind = other.kind(), "Unexpected message from frame"),
        }
    }

    /// Frame data plus everything captured in the host. The frame's trace is not modified.
    fn merge(&self, frame_trace: &Trace) -> Trace {
        let mut merged = frame_trace.clone();
        merged.clicks.extend(self.host_clicks.iter().cloned());
        merged
            .input_changes
            .extend(self.host_inputs.iter().cloned());
        merged.input_changes.sort_by_key(|change| change.timestamp);
        merged
    }

    fn finish(&mut self, trace: Trace) {
        self.timers.cancel(&ControllerTimer::ResultsTimeout);
        let url = self
            .target_url
            .clone()
            .unwrap_or_else(|| self.document.url());
        let source = generate_playwright_test_with(&url, &trace, &self.synthesis);

        info!(
            session = ?self.session_id,
            events = trace.event_count(),
            bytes = source.len(),
            "Test generated"
        );
        self.presenter.show_generated_test(&source);
        self.generated = Some(source);
        self.last_trace = Some(trace);
        self.state = ControllerState::Idle;
    }

    /// Copy the generated test. On failure the text stays available.
    pub fn copy_to_clipboard(&self) -> crate::Result<()> {
        let Some(source) = self.generated.as_deref() else {
            let err = crate::Error::Clipboard("no generated test to copy".to_string());
            self.presenter.notify(Notice::error(err.to_string()));
            return Err(err);
        };
        match self.clipboard.write_text(source) {
            Ok(()) => {
                self.presenter.notify(Notice::info("Test copied to clipboard"));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Clipboard write failed");
                self.presenter.notify(Notice::error(format!(
                    "Copy failed, select the test manually: {}",
                    e
                )));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{DomTree, Element};
    use crate::protocol::MemoryFrames;
    use crate::time::ManualClock;

    struct Fixture {
        controller: RecordingController<DomTree, MemoryFrames>,
        clock: ManualClock,
        presenter: MemoryPresenter,
    }

    fn fixture(frame_count: usize) -> Fixture {
        let clock = ManualClock::new(50_000);
        let mut frames = MemoryFrames::new();
        for _ in 0..frame_count {
            frames.add_frame();
        }
        let presenter = MemoryPresenter::new();
        let controller = RecordingController::new(
            DomTree::new("https://host.test/workspace"),
            frames,
            Arc::new(clock.clone()),
            ControllerConfig::default(),
        )
        .with_presenter(presenter.clone());
        Fixture {
            controller,
            clock,
            presenter,
        }
    }

    #[test]
    fn test_toggle_cycles_states_and_broadcasts() {
        let mut f = fixture(2);
        f.controller.toggle_recording();
        assert_eq!(f.controller.state(), ControllerState::Recording);
        assert!(f.controller.session_id().is_some());

        f.controller.toggle_recording();
        assert_eq!(f.controller.state(), ControllerState::AwaitingResults);

        // Ignored while awaiting results.
        f.controller.toggle_recording();
        assert_eq!(f.controller.state(), ControllerState::AwaitingResults);

        for id in f.controller.frames().frame_ids() {
            let inbox = f.controller.frames().inbox(id).unwrap();
            assert_eq!(inbox.drain(), vec![Message::Start, Message::Stop]);
        }
    }

    #[test]
    fn test_start_and_stop_only_act_in_matching_state() {
        let mut f = fixture(1);
        f.controller.stop_recording();
        assert_eq!(f.controller.state(), ControllerState::Idle);
        f.controller.start_recording();
        f.controller.start_recording();
        assert_eq!(f.controller.state(), ControllerState::Recording);
    }

    #[test]
    fn test_toolbar_clicks_are_not_recorded() {
        let mut f = fixture(0);
        let doc = f.controller.document_mut();
        let bar = doc.append(DomTree::BODY, Element::new("div").with_class("staktrak-toolbar"));
        let stop = doc.append(bar, Element::new("button").with_text("Stop"));
        let tab = doc.append(DomTree::BODY, Element::new("button").with_text("Preview"));

        f.controller.start_recording();
        f.controller.handle_host_event(&DomEvent::Click {
            target: stop,
            x: 0.0,
            y: 0.0,
        });
        f.controller.handle_host_event(&DomEvent::Click {
            target: tab,
            x: 3.0,
            y: 4.0,
        });

        assert_eq!(
            f.controller.host_clicks(),
            &[ClickDetail::new(3.0, 4.0, "text=Preview", 50_000)]
        );
    }

    #[test]
    fn test_host_input_debounce() {
        let mut f = fixture(0);
        let input = f.controller.document_mut().append(
            DomTree::BODY,
            Element::new("input").with_attr("placeholder", "Ask anything"),
        );
        f.controller.start_recording();

        for value in ["h", "he", "hey"] {
            f.controller.document_mut().set_value(input, value);
            f.controller.handle_host_event(&DomEvent::Input { target: input });
            f.clock.advance(100);
        }
        assert!(f.controller.host_inputs().is_empty());

        f.clock.advance(200);
        f.controller.poll();
        assert_eq!(
            f.controller.host_inputs(),
            &[InputChange::new(
                "[placeholder=\"Ask anything\"]",
                "hey",
                50_500,
                InputAction::Complete
            )]
        );
    }

    #[test]
    fn test_results_merge_host_clicks() {
        let mut f = fixture(1);
        let a = f
            .controller
            .document_mut()
            .append(DomTree::BODY, Element::new("button").with_text("Code"));
        f.controller.start_recording();
        f.clock.advance(100);
        f.controller
            .handle_host_event(&DomEvent::Click { target: a, x: 0.0, y: 0.0 });
        f.clock.advance(100);
        f.controller
            .handle_host_event(&DomEvent::Click { target: a, x: 0.0, y: 0.0 });
        f.controller.stop_recording();

        let mut frame_trace = Trace::started_at(50_000);
        frame_trace
            .clicks
            .push(ClickDetail::new(1.0, 1.0, "#frame-button", 50_050));
        f.controller
            .on_message(FrameId(0), &Message::results(frame_trace.clone()));

        assert_eq!(f.controller.state(), ControllerState::Idle);
        let merged = f.controller.last_trace().unwrap();
        assert_eq!(merged.clicks.count(), 3);
        assert_eq!(merged.clicks.details().len(), 3);
        // The frame's own data is untouched.
        assert_eq!(frame_trace.clicks.count(), 1);

        let source = f.controller.generated_test().unwrap();
        assert!(source.contains("page.goto('https://host.test/workspace')"));
        assert_eq!(f.presenter.generated_tests().len(), 1);
    }

    #[test]
    fn test_merge_keeps_time_order_when_frame_click_is_latest() {
        let mut f = fixture(1);
        let tab = f
            .controller
            .document_mut()
            .append(DomTree::BODY, Element::new("button").with_text("Files"));
        let field = f
            .controller
            .document_mut()
            .append(DomTree::BODY, Element::new("input").with_id("prompt"));
        f.controller.start_recording();

        f.clock.set(50_100);
        f.controller
            .handle_host_event(&DomEvent::Click { target: tab, x: 0.0, y: 0.0 });
        f.clock.set(50_200);
        f.controller
            .handle_host_event(&DomEvent::Click { target: tab, x: 0.0, y: 0.0 });
        f.controller.document_mut().set_value(field, "hi");
        f.controller.handle_host_event(&DomEvent::Input { target: field });
        f.clock.set(50_600);
        f.controller.stop_recording();

        let mut frame_trace = Trace::started_at(50_000);
        frame_trace
            .clicks
            .push(ClickDetail::new(1.0, 1.0, "#frame-button", 50_700));
        frame_trace.input_changes.push(InputChange::new(
            "#title",
            "Fix",
            50_800,
            InputAction::Complete,
        ));
        f.controller
            .on_message(FrameId(0), &Message::results(frame_trace));

        let merged = f.controller.last_trace().unwrap();
        let clicks: Vec<u64> = merged.clicks.details().iter().map(|c| c.timestamp).collect();
        assert_eq!(clicks, vec![50_100, 50_200, 50_700]);
        assert_eq!(merged.clicks.count(), 3);
        let inputs: Vec<u64> = merged.input_changes.iter().map(|c| c.timestamp).collect();
        assert_eq!(inputs, vec![50_500, 50_800]);
    }

    #[test]
    fn test_late_results_are_ignored() {
        let mut f = fixture(1);
        f.controller.start_recording();
        f.controller.stop_recording();
        f.controller
            .on_message(FrameId(0), &Message::results(Trace::started_at(1)));
        let first = f.controller.generated_test().map(str::to_string);

        f.controller
            .on_message(FrameId(0), &Message::results(Trace::started_at(2)));
        assert_eq!(f.controller.generated_test().map(str::to_string), first);
        assert_eq!(f.presenter.generated_tests().len(), 1);
    }

    #[test]
    fn test_timeout_without_anything_generates_empty_test() {
        let mut f = fixture(1);
        f.controller.start_recording();
        f.controller.stop_recording();
        f.clock.advance(999);
        f.controller.poll();
        assert_eq!(f.controller.state(), ControllerState::AwaitingResults);

        f.clock.advance(1);
        f.controller.poll();
        assert_eq!(f.controller.state(), ControllerState::Idle);
        let source = f.controller.generated_test().unwrap();
        assert!(source.contains(crate::codegen::NO_INTERACTIONS_SENTINEL));
        assert_eq!(f.presenter.messages_at(NoticeLevel::Warning).len(), 1);
    }

    #[test]
    fn test_timeout_with_host_clicks_uses_host_data() {
        let mut f = fixture(0);
        let tab = f.controller.document_mut().append(
            DomTree::BODY,
            Element::new("div").with_attr("role", "tab").with_text("Logs"),
        );
        f.controller.start_recording();
        f.clock.advance(400);
        f.controller
            .handle_host_event(&DomEvent::Click { target: tab, x: 0.0, y: 0.0 });
        f.controller.stop_recording();
        f.clock.advance(1_000);
        f.controller.poll();

        let source = f.controller.generated_test().unwrap();
        assert!(source.contains("await page.waitForTimeout(400);"));
        assert!(source.contains("await page.locator('text=Logs').click();"));
    }

    #[test]
    fn test_stop_flushes_pending_host_input() {
        let mut f = fixture(0);
        let input = f
            .controller
            .document_mut()
            .append(DomTree::BODY, Element::new("input").with_id("q"));
        f.controller.start_recording();
        f.controller.document_mut().set_value(input, "bounty");
        f.controller
            .handle_host_event(&DomEvent::Input { target: input });
        f.controller.stop_recording();

        assert_eq!(f.controller.host_inputs().len(), 1);
        assert_eq!(f.controller.host_inputs()[0].value, "bounty");
    }

    #[test]
    fn test_unreachable_frame_is_a_notice() {
        let mut f = fixture(1);
        let id = f.controller.frames().frame_ids()[0];
        f.controller.frames().inbox(id).unwrap().close();

        f.controller.start_recording();
        assert_eq!(f.controller.state(), ControllerState::Recording);
        assert_eq!(f.presenter.messages_at(NoticeLevel::Error).len(), 1);
    }

    #[test]
    fn test_frame_notifications_forwarded() {
        let mut f = fixture(1);
        f.controller
            .on_message(FrameId(0), &Message::SelectionModeEnded);
        assert_eq!(
            f.presenter.frame_messages(),
            vec![Message::SelectionModeEnded]
        );
    }

    #[test]
    fn test_copy_to_clipboard() {
        let clipboard = MemoryClipboard::new();
        let mut f = fixture(0);
        f.controller = f.controller.with_clipboard(clipboard.clone());

        assert!(f.controller.copy_to_clipboard().is_err());

        f.controller.start_recording();
        f.controller.stop_recording();
        f.clock.advance(1_000);
        f.controller.poll();
        f.controller.copy_to_clipboard().unwrap();
        assert_eq!(
            clipboard.contents().as_deref(),
            f.controller.generated_test()
        );

        clipboard.deny();
        assert!(f.controller.copy_to_clipboard().is_err());
        assert!(f.controller.generated_test().is_some());
    }
}
