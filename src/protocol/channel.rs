//! Message ports
//!
//! [`MessagePort`] is the `postMessage` target a recorder talks to (its
//! embedding window). [`FrameSet`] is the controller's view of the frames
//! embedded in the host document. The in-memory implementations queue
//! messages until a driver delivers them.

use super::message::Message;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One-way message target
pub trait MessagePort {
    fn post(&self, message: &Message) -> crate::Result<()>;
}

/// Identifier of an embedded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(pub u32);

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "frame-{}", self.0)
    }
}

/// Frames currently embedded in the host document
pub trait FrameSet {
    /// Frames in document order
    fn frame_ids(&self) -> Vec<FrameId>;

    fn post_to_frame(&self, frame: FrameId, message: &Message) -> crate::Result<()>;
}

/// Queue-backed port. Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct MemoryPort {
    queue: Arc<Mutex<VecDeque<Message>>>,
    closed: Arc<AtomicBool>,
}

impl MemoryPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every further `post` fail, as a detached or cross-origin window would
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Take every queued message, oldest first
    pub fn drain(&self) -> Vec<Message> {
        self.queue.lock().drain(..).collect()
    }

    /// Take the oldest queued message
    pub fn pop(&self) -> Option<Message> {
        self.queue.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl MessagePort for MemoryPort {
    fn post(&self, message: &Message) -> crate::Result<()> {
        if self.is_closed() {
            return Err(crate::Error::Delivery(format!(
                "port closed, dropped {}",
                message.kind()
            )));
        }
        self.queue.lock().push_back(message.clone());
        Ok(())
    }
}

/// In-memory frame registry, one [`MemoryPort`] inbox per frame
#[derive(Debug, Clone, Default)]
pub struct MemoryFrames {
    frames: Vec<(FrameId, MemoryPort)>,
}

impl MemoryFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a frame and return the inbox the recorder inside it reads
    pub fn add_frame(&mut self) -> (FrameId, MemoryPort) {
        let id = FrameId(self.frames.len() as u32);
        let port = MemoryPort::new();
        self.frames.push((id, port.clone()));
        (id, port)
    }

    pub fn inbox(&self, frame: FrameId) -> Option<&MemoryPort> {
        self.frames
            .iter()
            .find(|(id, _)| *id == frame)
            .map(|(_, port)| port)
    }
}

impl FrameSet for MemoryFrames {
    fn frame_ids(&self) -> Vec<FrameId> {
        self.frames.iter().map(|(id, _)| *id).collect()
    }

    fn post_to_frame(&self, frame: FrameId, message: &Message) -> crate::Result<()> {
        let port = self
            .inbox(frame)
            .ok_or_else(|| crate::Error::Delivery(format!("unknown {}", frame)))?;
        port.post(message)
    }
}
