//! Host/frame message protocol
//!
//! Messages are JSON objects discriminated by a `type` field carrying a
//! `staktrak-*` tag. Delivery is fire-and-forget: a port either accepts a
//! message or reports a delivery error, and nothing waits for a reply.

pub mod channel;
pub mod message;

pub use channel::{FrameId, FrameSet, MemoryFrames, MemoryPort, MessagePort};
pub use message::Message;
