//! Time sources and cooperative timers
//!
//! Every timestamp in a trace is epoch milliseconds. Components never read the
//! wall clock directly; they are handed a [`Clock`] so that tests and replays can
//! drive time explicitly.

pub mod clock;
pub mod timers;

pub use clock::{Clock, ManualClock, SystemClock};
pub use timers::{TimerId, TimerQueue};
