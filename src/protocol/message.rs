//! Message kinds exchanged between the host document and recorded frames

use crate::capture::trace::Trace;
use serde::{Deserialize, Serialize};

/// Every message understood by the recorder or the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// Frame → host, once listeners are attached
    #[serde(rename = "staktrak-setup")]
    Setup { status: String },

    /// Host → frame
    #[serde(rename = "staktrak-start")]
    Start,

    /// Host → frame
    #[serde(rename = "staktrak-stop")]
    Stop,

    /// Host → frame
    #[serde(rename = "staktrak-enable-selection")]
    EnableSelection,

    /// Host → frame
    #[serde(rename = "staktrak-disable-selection")]
    DisableSelection,

    /// Frame → host, in reply to `Stop`
    #[serde(rename = "staktrak-results")]
    Results { data: Box<Trace> },

    /// Frame → host, a text selection was turned into an assertion
    #[serde(rename = "staktrak-selection")]
    Selection { text: String, selector: String },

    /// Frame → host, ask the host to show the assertion popup
    #[serde(rename = "staktrak-show-popup")]
    ShowPopup { text: String, selector: String },

    /// Frame → host, selection mode was left with Escape
    #[serde(rename = "staktrak-selection-mode-ended")]
    SelectionModeEnded,
}

impl Message {
    /// Readiness notice posted by a recorder after attaching
    pub fn ready() -> Self {
        Message::Setup {
            status: "ready".to_string(),
        }
    }

    pub fn results(trace: Trace) -> Self {
        Message::Results {
            data: Box::new(trace),
        }
    }

    /// Wire tag of this message
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Setup { .. } => "staktrak-setup",
            Message::Start => "staktrak-start",
            Message::Stop => "staktrak-stop",
            Message::EnableSelection => "staktrak-enable-selection",
            Message::DisableSelection => "staktrak-disable-selection",
            Message::Results { .. } => "staktrak-results",
            Message::Selection { .. } => "staktrak-selection",
            Message::ShowPopup { .. } => "staktrak-show-popup",
            Message::SelectionModeEnded => "staktrak-selection-mode-ended",
        }
    }

    /// Parse a message received over the wire
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(|e| crate::Error::Protocol(e.to_string()))
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
