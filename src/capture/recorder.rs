//! In-document event recorder
//!
//! A [`Recorder`] owns the trace for one document, the timers that debounce
//! inputs and selection gestures, and the bookkeeping for listeners attached
//! while recording. Raw events arrive through [`Recorder::handle_event`] and
//! directives through [`Recorder::handle_message`]; results leave through the
//! parent [`MessagePort`].

use super::selector::{click_path, element_selector};
use super::trace::{
    Assertion, AssertionKind, ClickDetail, FocusChange, FocusKind, FormInteraction, InputAction,
    InputChange, KeyActivity, MediaInteraction, MediaKind, MouseSample, NavigationEntry,
    NavigationKind, ScrollSample, TouchRecord, Trace, UserInfo, VisibilitySample,
    WindowSizeSample,
};
use crate::app::config::RecorderConfig;
use crate::dom::{Document, DomEvent, EventOutcome, NodeId};
use crate::protocol::{Message, MessagePort};
use crate::time::{Clock, TimerQueue};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Body class shown while selection mode is active
pub const SELECTION_CLASS: &str = "staktrak-selection-active";

/// Recording state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
}

/// Timers owned by the recorder
#[derive(Debug, Clone, PartialEq, Eq)]
enum RecorderTimer {
    /// Debounced `complete` record for one input key
    InputComplete(String),
    /// Pointer sampling interval
    MouseSample,
    /// Debounced selection → assertion
    AssertionCommit,
    /// Clear the live selection after an assertion
    SelectionClear,
}

#[derive(Debug, Clone)]
struct PendingInput {
    target: NodeId,
    selector: String,
}

#[derive(Debug, Clone)]
struct PendingSelection {
    text: String,
    selector: String,
}

/// Event recorder for a single document
pub struct Recorder<D: Document, P: MessagePort> {
    document: D,
    parent: P,
    clock: Arc<dyn Clock>,
    config: RecorderConfig,
    state: RecorderState,
    selecting: bool,
    trace: Trace,
    timers: TimerQueue<RecorderTimer>,
    pending_inputs: BTreeMap<String, PendingInput>,
    pending_selection: Option<PendingSelection>,
    last_assertion_at: BTreeMap<String, u64>,
    last_pointer: Option<(f64, f64)>,
    history_wrapped: bool,
    form_listeners: BTreeSet<NodeId>,
    media_listeners: BTreeSet<NodeId>,
}

impl<D: Document, P: MessagePort> Recorder<D, P> {
    /// Attach to `document` and announce readiness to the embedding context
    pub fn new(document: D, parent: P, clock: Arc<dyn Clock>, mut config: RecorderConfig) -> Self {
        // A zero interval would never advance the sampling timer.
        config.mouse_movement_interval_ms = config.mouse_movement_interval_ms.max(1);
        let recorder = Self {
            document,
            parent,
            clock,
            config,
            state: RecorderState::Idle,
            selecting: false,
            trace: Trace::default(),
            timers: TimerQueue::new(),
            pending_inputs: BTreeMap::new(),
            pending_selection: None,
            last_assertion_at: BTreeMap::new(),
            last_pointer: None,
            history_wrapped: false,
            form_listeners: BTreeSet::new(),
            media_listeners: BTreeSet::new(),
        };
        recorder.post(&Message::ready());
        recorder
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    pub fn is_selecting(&self) -> bool {
        self.selecting
    }

    /// Trace being built (or the last one, when not cleared after processing)
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// Mutable access for drivers that update the document before dispatching events
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Whether an input `complete` record is waiting on its debounce
    pub fn has_pending_input(&self, key: &str) -> bool {
        self.pending_inputs.contains_key(key)
    }

    /// Earliest pending timer, so a driver knows when to call back
    pub fn next_timer_due(&self) -> Option<u64> {
        self.timers.next_due()
    }

    /// Apply a directive from the embedding context
    pub fn handle_message(&mut self, message: &Message) {
        self.run_due_timers();
        match message {
            Message::Start => self.start(),
            Message::Stop => self.stop(),
            Message::EnableSelection => self.enable_selection(),
            Message::DisableSelection => self.disable_selection(),
            other => debug!(kind = other.kind(), "Recorder ignoring message"),
        }
    }

    /// Begin a recording session
    pub fn start(&mut self) {
        if self.is_recording() {
            warn!("Start requested while already recording; ignoring");
            return;
        }

        let now = self.clock.now_ms();
        self.trace = Trace::started_at(now);
        if self.config.user_info {
            self.trace.user_info = UserInfo {
                window_size: self.document.window_size(),
                user_agent: self.document.user_agent(),
                platform: self.document.platform(),
            };
        }

        if self.config.page_navigation && !self.history_wrapped {
            // pushState stays wrapped for the recorder's lifetime.
            self.history_wrapped = true;
        }

        let body = self.document.body();
        self.register_auxiliary_listeners(&[body]);

        self.last_pointer = None;
        if self.config.mouse_movement {
            self.timers.schedule(
                RecorderTimer::MouseSample,
                now + self.config.mouse_movement_interval_ms,
            );
        }

        self.state = RecorderState::Recording;
        info!(
            url = %self.document.url(),
            start_time = now,
            "Recording started"
        );
    }

    /// Finish the session and post the trace to the embedding context
    pub fn stop(&mut self) {
        if !self.is_recording() {
            warn!("Stop requested while idle; ignoring");
            return;
        }

        let now = self.clock.now_ms();
        self.flush_pending_inputs(now);
        self.timers.clear();
        self.pending_selection = None;
        self.detach_listeners();

        self.trace.time.stop_time = now;
        self.trace.time.current_time = now;
        self.state = RecorderState::Idle;

        info!(
            clicks = self.trace.clicks.count(),
            inputs = self.trace.input_changes.len(),
            assertions = self.trace.assertions.len(),
            events = self.trace.event_count(),
            "Recording stopped"
        );

        self.post(&Message::results(self.trace.clone()));

        if self.config.clear_after_process {
            self.trace = Trace::default();
        }

        // Selection mode outlives the recording and may still need its timers.
        if !self.selecting {
            self.last_assertion_at.clear();
        }
    }

    pub fn enable_selection(&mut self) {
        self.selecting = true;
        self.document.set_body_class(SELECTION_CLASS, true);
        debug!("Selection mode enabled");
    }

    pub fn disable_selection(&mut self) {
        self.selecting = false;
        self.document.set_body_class(SELECTION_CLASS, false);
        self.pending_selection = None;
        self.timers.cancel(&RecorderTimer::AssertionCommit);
        debug!("Selection mode disabled");
    }

    /// Dispatch a raw DOM event to its listener
    pub fn handle_event(&mut self, event: &DomEvent) -> EventOutcome {
        self.run_due_timers();
        let now = self.clock.now_ms();

        // Selection-mode listeners stay attached whether or not we are recording.
        match event {
            DomEvent::KeyDown { key } if self.selecting && key == "Escape" => {
                self.disable_selection();
                self.post(&Message::SelectionModeEnded);
                return EventOutcome::Continue;
            }
            DomEvent::MouseUp { .. } if self.selecting => {
                self.on_selection_gesture(now);
                return EventOutcome::Continue;
            }
            _ => {}
        }

        if !self.is_recording() {
            return EventOutcome::Continue;
        }

        self.trace.time.current_time = now;
        debug!(event = event.name(), at = now, "Recorder event");

        match event {
            DomEvent::Click { target, x, y } => self.on_click(*target, *x, *y, now),
            DomEvent::MouseMove { x, y } => {
                if self.config.mouse_movement {
                    self.last_pointer = Some((*x, *y));
                }
            }
            DomEvent::MouseUp { .. } => {}
            DomEvent::Scroll { x, y } => {
                if self.config.mouse_scroll {
                    self.trace.mouse_scroll.push(ScrollSample(*x, *y, now));
                }
            }
            DomEvent::KeyDown { key } => self.on_key(key, now),
            DomEvent::Input { target } | DomEvent::Change { target } => {
                self.on_input(*target, now)
            }
            DomEvent::Focus { target } => self.on_focus(*target, FocusKind::Focus, now),
            DomEvent::Blur { target } => self.on_focus(*target, FocusKind::Blur, now),
            DomEvent::Submit { form } => return self.on_submit(*form, now),
            DomEvent::MediaPlay { target } => self.on_media_play(*target, now),
            DomEvent::Touch { phase, x, y } => {
                if self.config.touch_events {
                    self.trace.touch_events.push(TouchRecord {
                        kind: *phase,
                        x: *x,
                        y: *y,
                        timestamp: now,
                    });
                }
            }
            DomEvent::Resize { width, height } => {
                if self.config.window_resize {
                    self.trace
                        .window_sizes
                        .push(WindowSizeSample(*width, *height, now));
                }
            }
            DomEvent::VisibilityChange { state } => {
                if self.config.visibility_change {
                    self.trace
                        .visibility_changes
                        .push(VisibilitySample(state.clone(), now));
                }
            }
            DomEvent::PopState { url } => {
                self.record_navigation(NavigationKind::PopState, url, now);
            }
            DomEvent::PushState { url } => {
                if self.history_wrapped {
                    self.record_navigation(NavigationKind::PushState, url, now);
                    self.record_navigation(NavigationKind::LocationChange, url, now);
                }
            }
            DomEvent::NodesAdded { nodes } => self.register_auxiliary_listeners(nodes),
        }

        EventOutcome::Continue
    }

    /// Fire every timer due at the clock's current time
    pub fn run_due_timers(&mut self) {
        let now = self.clock.now_ms();
        while let Some((due_at, timer)) = self.timers.pop_due(now) {
            self.fire_timer(timer, due_at, now);
        }
    }

    fn fire_timer(&mut self, timer: RecorderTimer, due_at: u64, now: u64) {
        match timer {
            RecorderTimer::InputComplete(key) => {
                if let Some(pending) = self.pending_inputs.remove(&key) {
                    self.emit_complete(pending, due_at);
                }
            }
            RecorderTimer::MouseSample => {
                self.sample_pointer(due_at);
                if self.is_recording() {
                    // Keep the interval phase even if the driver was late.
                    let mut next = due_at + self.config.mouse_movement_interval_ms;
                    while next <= now {
                        next += self.config.mouse_movement_interval_ms;
                    }
                    self.timers.schedule(RecorderTimer::MouseSample, next);
                }
            }
            RecorderTimer::AssertionCommit => self.commit_selection(due_at),
            RecorderTimer::SelectionClear => self.document.clear_selection(),
        }
    }

    fn on_click(&mut self, target: NodeId, x: f64, y: f64, now: u64) {
        if !self.config.clicks {
            return;
        }
        let path = self.document.composed_path(target);
        let selector = click_path(&self.document, &path);
        self.trace.clicks.push(ClickDetail::new(x, y, selector, now));
    }

    fn on_key(&mut self, key: &str, now: u64) {
        if !self.config.keyboard_activity || self.document.focus_in_text_field() {
            return;
        }
        self.trace
            .keyboard_activities
            .push(KeyActivity(key.to_string(), now));
    }

    /// Key under which an element's pending `complete` record is debounced
    fn input_key(&self, target: NodeId, selector: &str) -> String {
        self.document
            .element(target)
            .and_then(|el| el.element_id())
            .map(str::to_string)
            .unwrap_or_else(|| selector.to_string())
    }

    fn on_input(&mut self, target: NodeId, now: u64) {
        let Some(el) = self.document.element(target) else {
            return;
        };
        let value = el.current_value().to_string();
        let selector = element_selector(&self.document, target);
        let key = self.input_key(target, &selector);

        self.trace.input_changes.push(InputChange::new(
            selector.clone(),
            value,
            now,
            InputAction::Intermediate,
        ));

        self.pending_inputs
            .insert(key.clone(), PendingInput { target, selector });
        self.timers.reschedule(
            RecorderTimer::InputComplete(key),
            now + self.config.input_debounce_ms,
        );
    }

    fn on_focus(&mut self, target: NodeId, kind: FocusKind, now: u64) {
        let is_text_field = self
            .document
            .element(target)
            .is_some_and(|el| el.is_text_field());
        if !is_text_field {
            return;
        }

        let selector = element_selector(&self.document, target);
        if kind == FocusKind::Blur {
            let key = self.input_key(target, &selector);
            if let Some(pending) = self.pending_inputs.remove(&key) {
                self.timers.cancel(&RecorderTimer::InputComplete(key));
                self.emit_complete(pending, now);
            }
        }

        self.trace.focus_changes.push(FocusChange {
            element_selector: selector,
            kind,
            timestamp: now,
        });
    }

    /// Record the field's value as it is right now
    fn emit_complete(&mut self, pending: PendingInput, timestamp: u64) {
        let value = self
            .document
            .element(pending.target)
            .map(|el| el.current_value().to_string())
            .unwrap_or_default();
        self.trace.input_changes.push(InputChange::new(
            pending.selector,
            value,
            timestamp,
            InputAction::Complete,
        ));
    }

    fn flush_pending_inputs(&mut self, now: u64) {
        let keys = self
            .timers
            .drain_matching(|t| matches!(t, RecorderTimer::InputComplete(_)));
        for timer in keys {
            if let RecorderTimer::InputComplete(key) = timer {
                if let Some(pending) = self.pending_inputs.remove(&key) {
                    self.emit_complete(pending, now);
                }
            }
        }
        self.pending_inputs.clear();
    }

    fn on_selection_gesture(&mut self, now: u64) {
        let Some(selection) = self.document.selection() else {
            return;
        };
        let text = selection.text.trim();
        if text.is_empty() {
            return;
        }
        let selector = element_selector(&self.document, selection.anchor_element());
        self.pending_selection = Some(PendingSelection {
            text: text.to_string(),
            selector,
        });
        self.timers.reschedule(
            RecorderTimer::AssertionCommit,
            now + self.config.assertion_debounce_ms,
        );
    }

    fn commit_selection(&mut self, now: u64) {
        let Some(PendingSelection { text, selector }) = self.pending_selection.take() else {
            return;
        };

        let window = self.config.assertion_dedup_window_ms;
        if let Some(previous) = self.last_assertion_at.get(&selector) {
            if now.saturating_sub(*previous) < window {
                debug!(%selector, "Duplicate selection assertion dropped");
                return;
            }
        }
        self.last_assertion_at.insert(selector.clone(), now);

        if self.is_recording() {
            self.trace.assertions.push(Assertion {
                kind: AssertionKind::HasText,
                selector: selector.clone(),
                value: text.clone(),
                timestamp: now,
            });
        }

        self.post(&Message::Selection {
            text: text.clone(),
            selector: selector.clone(),
        });
        self.post(&Message::ShowPopup { text, selector });

        self.timers.reschedule(
            RecorderTimer::SelectionClear,
            now + self.config.selection_clear_delay_ms,
        );
    }

    fn sample_pointer(&mut self, now: u64) {
        let Some((x, y)) = self.last_pointer else {
            return;
        };
        let unchanged = self
            .trace
            .mouse_movements
            .last()
            .is_some_and(|last| last.0 == x && last.1 == y);
        if !unchanged {
            self.trace.mouse_movements.push(MouseSample(x, y, now));
        }
    }

    /// Mutation-observer side: attach submit/play listeners under `roots`
    fn register_auxiliary_listeners(&mut self, roots: &[NodeId]) {
        for root in roots {
            for node in self.document.descendants_and_self(*root) {
                let Some(el) = self.document.element(node) else {
                    continue;
                };
                if el.is_form() && self.config.form_interactions {
                    self.form_listeners.insert(node);
                } else if el.is_media() && self.config.audio_video_interaction {
                    self.media_listeners.insert(node);
                }
            }
        }
    }

    fn on_submit(&mut self, form: NodeId, now: u64) -> EventOutcome {
        if !self.form_listeners.contains(&form) {
            return EventOutcome::Continue;
        }
        let name = self
            .document
            .element(form)
            .and_then(|el| el.attr("name").or_else(|| el.element_id()))
            .unwrap_or_default()
            .to_string();
        self.trace
            .form_interactions
            .push(FormInteraction { name, timestamp: now });
        EventOutcome::PreventDefault
    }

    fn on_media_play(&mut self, target: NodeId, now: u64) {
        if !self.media_listeners.contains(&target) {
            return;
        }
        let src = self
            .document
            .element(target)
            .and_then(|el| el.attr("src"))
            .unwrap_or_default()
            .to_string();
        self.trace.media_interactions.push(MediaInteraction {
            kind: MediaKind::Play,
            src,
            timestamp: now,
        });
    }

    fn record_navigation(&mut self, kind: NavigationKind, url: &str, now: u64) {
        if !self.config.page_navigation {
            return;
        }
        self.trace.navigation_history.push(NavigationEntry {
            kind,
            url: url.to_string(),
            timestamp: now,
        });
    }

    /// Drop every listener registration; safe to call repeatedly
    fn detach_listeners(&mut self) {
        self.form_listeners.clear();
        self.media_listeners.clear();
        self.last_pointer = None;
    }

    fn post(&self, message: &Message) {
        if let Err(e) = self.parent.post(message) {
            warn!(kind = message.kind(), error = %e, "Failed to post message to parent");
        }
    }
}
