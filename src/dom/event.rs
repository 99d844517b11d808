//! Raw events delivered to listeners

use super::node::NodeId;
use serde::{Deserialize, Serialize};

/// Touch phases that are recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchKind {
    TouchStart,
    TouchMove,
    TouchEnd,
}

/// A raw DOM event, one variant per listener kind.
///
/// Target nodes refer into the document the event was dispatched in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DomEvent {
    Click {
        target: NodeId,
        x: f64,
        y: f64,
    },
    MouseMove {
        x: f64,
        y: f64,
    },
    MouseUp {
        x: f64,
        y: f64,
    },
    /// Window scroll; coordinates are the new scroll offsets
    Scroll {
        x: f64,
        y: f64,
    },
    KeyDown {
        key: String,
    },
    /// The target's value has already been updated when this is dispatched
    Input {
        target: NodeId,
    },
    Change {
        target: NodeId,
    },
    Focus {
        target: NodeId,
    },
    Blur {
        target: NodeId,
    },
    Submit {
        form: NodeId,
    },
    MediaPlay {
        target: NodeId,
    },
    Touch {
        phase: TouchKind,
        x: f64,
        y: f64,
    },
    Resize {
        width: u32,
        height: u32,
    },
    VisibilityChange {
        state: String,
    },
    /// Back/forward navigation; `url` is the location after the change
    PopState {
        url: String,
    },
    /// A `history.pushState` call
    PushState {
        url: String,
    },
    /// Mutation observer record: nodes inserted under the body
    NodesAdded {
        nodes: Vec<NodeId>,
    },
}

impl DomEvent {
    /// Listener name, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            DomEvent::Click { .. } => "click",
            DomEvent::MouseMove { .. } => "mousemove",
            DomEvent::MouseUp { .. } => "mouseup",
            DomEvent::Scroll { .. } => "scroll",
            DomEvent::KeyDown { .. } => "keydown",
            DomEvent::Input { .. } => "input",
            DomEvent::Change { .. } => "change",
            DomEvent::Focus { .. } => "focus",
            DomEvent::Blur { .. } => "blur",
            DomEvent::Submit { .. } => "submit",
            DomEvent::MediaPlay { .. } => "play",
            DomEvent::Touch { .. } => "touch",
            DomEvent::Resize { .. } => "resize",
            DomEvent::VisibilityChange { .. } => "visibilitychange",
            DomEvent::PopState { .. } => "popstate",
            DomEvent::PushState { .. } => "pushstate",
            DomEvent::NodesAdded { .. } => "mutation",
        }
    }
}

/// What a listener asks the dispatcher to do after handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventOutcome {
    #[default]
    Continue,
    PreventDefault,
}
