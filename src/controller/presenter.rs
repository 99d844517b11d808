//! Output surfaces of the controller: notices, the generated test and the clipboard

use crate::protocol::Message;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Dismissible notification shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Where the controller reports progress and results
pub trait Presenter {
    fn notify(&self, notice: Notice);

    fn show_generated_test(&self, source: &str);

    /// Frame messages the controller does not consume itself
    fn frame_message(&self, _message: &Message) {}
}

/// Clipboard write access
pub trait Clipboard {
    fn write_text(&self, text: &str) -> crate::Result<()>;
}

/// Presenter that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPresenter;

impl Presenter for TracingPresenter {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!(message = %notice.message, "Notice"),
            NoticeLevel::Warning => warn!(message = %notice.message, "Notice"),
            NoticeLevel::Error => error!(message = %notice.message, "Notice"),
        }
    }

    fn show_generated_test(&self, source: &str) {
        info!(lines = source.lines().count(), "Generated test ready");
    }

    fn frame_message(&self, message: &Message) {
        info!(kind = message.kind(), "Frame message");
    }
}

#[derive(Debug, Default)]
struct Recorded {
    notices: Vec<Notice>,
    tests: Vec<String>,
    frame_messages: Vec<Message>,
}

/// Presenter that keeps everything it is given. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryPresenter {
    inner: Arc<Mutex<Recorded>>,
}

impl MemoryPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.inner.lock().notices.clone()
    }

    /// Notices at `level`, messages only
    pub fn messages_at(&self, level: NoticeLevel) -> Vec<String> {
        self.inner
            .lock()
            .notices
            .iter()
            .filter(|n| n.level == level)
            .map(|n| n.message.clone())
            .collect()
    }

    pub fn generated_tests(&self) -> Vec<String> {
        self.inner.lock().tests.clone()
    }

    pub fn frame_messages(&self) -> Vec<Message> {
        self.inner.lock().frame_messages.clone()
    }
}

impl Presenter for MemoryPresenter {
    fn notify(&self, notice: Notice) {
        self.inner.lock().notices.push(notice);
    }

    fn show_generated_test(&self, source: &str) {
        self.inner.lock().tests.push(source.to_string());
    }

    fn frame_message(&self, message: &Message) {
        self.inner.lock().frame_messages.push(message.clone());
    }
}

/// Clipboard for environments without one; every write fails
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableClipboard;

impl Clipboard for UnavailableClipboard {
    fn write_text(&self, _text: &str) -> crate::Result<()> {
        Err(crate::Error::Clipboard("no clipboard available".to_string()))
    }
}

/// In-memory clipboard. Clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Arc<Mutex<Option<String>>>,
    denied: Arc<Mutex<bool>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject further writes, as a browser does without permission
    pub fn deny(&self) {
        *self.denied.lock() = true;
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> crate::Result<()> {
        if *self.denied.lock() {
            return Err(crate::Error::Clipboard("write permission denied".to_string()));
        }
        *self.contents.lock() = Some(text.to_string());
        Ok(())
    }
}
