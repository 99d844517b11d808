//! Replay session files
//!
//! A session pairs document snapshots (one host, any number of frames) with a
//! timed script of user actions. Replaying it drives a recorder per frame and
//! a controller in the host exactly as a browser would.

use crate::dom::{DomEvent, DomTree, Element, NodeId};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current session format version
pub const CURRENT_FORMAT_VERSION: &str = "1.0";

/// Where a scripted step happens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepTarget {
    Host,
    Frame(u32),
}

/// A scripted action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Action {
    /// Press the controller's record button
    Toggle,
    EnableSelection,
    DisableSelection,
    /// Update a field's value without dispatching anything
    SetValue { node: NodeId, value: String },
    Focus {
        #[serde(default)]
        node: Option<NodeId>,
    },
    SelectText { node: NodeId, text: String },
    /// Insert an element; observers are notified with a `nodesAdded` event
    Append { parent: NodeId, element: Element },
    Navigate { url: String },
    /// Dispatch a raw event
    Dispatch { event: DomEvent },
}

/// One line of the script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Offset from the session start (ms)
    pub at: u64,
    #[serde(default = "default_target")]
    pub target: StepTarget,
    #[serde(flatten)]
    pub action: Action,
}

fn default_target() -> StepTarget {
    StepTarget::Host
}

/// An embedded frame
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFrame {
    pub document: DomTree,
    /// The frame's messages never reach the host
    #[serde(default)]
    pub detached: bool,
}

/// Session header
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionMetadata {
    pub name: String,
    /// Epoch milliseconds at which the script starts
    pub start_at: u64,
    /// URL generated tests navigate to; the host URL when absent
    pub target_url: Option<String>,
    pub format_version: String,
}

impl Default for SessionMetadata {
    fn default() -> Self {
        Self {
            name: String::new(),
            start_at: 0,
            target_url: None,
            format_version: CURRENT_FORMAT_VERSION.to_string(),
        }
    }
}

/// A replayable session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub metadata: SessionMetadata,
    pub host: DomTree,
    #[serde(default)]
    pub frames: Vec<SessionFrame>,
    #[serde(default)]
    pub script: Vec<Step>,
}

impl Session {
    pub fn new(name: &str, start_at: u64, host: DomTree) -> Self {
        Self {
            metadata: SessionMetadata {
                name: name.to_string(),
                start_at,
                ..Default::default()
            },
            host,
            frames: Vec::new(),
            script: Vec::new(),
        }
    }

    /// Add a frame and return the target addressing it
    pub fn add_frame(&mut self, document: DomTree) -> StepTarget {
        self.frames.push(SessionFrame {
            document,
            detached: false,
        });
        StepTarget::Frame(self.frames.len() as u32 - 1)
    }

    pub fn push(&mut self, at: u64, target: StepTarget, action: Action) -> &mut Self {
        self.script.push(Step { at, target, action });
        self
    }

    /// Convenience for `Action::Dispatch`
    pub fn dispatch(&mut self, at: u64, target: StepTarget, event: DomEvent) -> &mut Self {
        self.push(at, target, Action::Dispatch { event })
    }

    /// Check documents and step targets
    pub fn validate(&self) -> crate::Result<()> {
        self.host.validate()?;
        for frame in &self.frames {
            frame.document.validate()?;
        }
        for (index, step) in self.script.iter().enumerate() {
            if let StepTarget::Frame(frame) = step.target {
                if frame as usize >= self.frames.len() {
                    return Err(crate::Error::Session(format!(
                        "step {} targets missing frame {}",
                        index, frame
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a session file.
    ///
    /// An unknown format version only logs a warning.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let session: Session = serde_json::from_str(&content)?;
        if session.metadata.format_version != CURRENT_FORMAT_VERSION {
            tracing::warn!(
                name = %session.metadata.name,
                found = %session.metadata.format_version,
                expected = CURRENT_FORMAT_VERSION,
                "Session has different format version; some fields may use default values"
            );
        }
        session.validate()?;
        Ok(session)
    }
}
