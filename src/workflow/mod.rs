//! Session replay
//!
//! Drives recorded sessions through the recorder and controller in-process.

pub mod replay;
pub mod session;

pub use replay::{replay_session, Replay, ReplayOutcome};
pub use session::{Action, Session, SessionFrame, Step, StepTarget};
