//! Millisecond clocks
//!
//! [`SystemClock`] reads UTC wall time through chrono. [`ManualClock`] is a
//! shared, settable clock used by tests and by session replay.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of epoch-millisecond timestamps
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch
    fn now_ms(&self) -> u64;
}

/// Wall clock backed by `chrono::Utc`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        // Pre-epoch system time is clamped to zero rather than wrapping.
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Manually advanced clock.
///
/// Clones share the same underlying instant, so a test can hold one handle
/// while the recorder and controller hold others.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock frozen at `start_ms`
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Jump to an absolute instant. Moving backwards is ignored.
    pub fn set(&self, ms: u64) {
        self.now.fetch_max(ms, Ordering::SeqCst);
    }

    /// Advance by `delta_ms` and return the new instant
    pub fn advance(&self, delta_ms: u64) -> u64 {
        self.now.fetch_add(delta_ms, Ordering::SeqCst) + delta_ms
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(1_000);
        let handle = clock.clone();

        assert_eq!(handle.advance(250), 1_250);
        assert_eq!(clock.now_ms(), 1_250);
    }

    #[test]
    fn test_manual_clock_never_moves_backwards() {
        let clock = ManualClock::new(5_000);
        clock.set(4_000);
        assert_eq!(clock.now_ms(), 5_000);

        clock.set(6_000);
        assert_eq!(clock.now_ms(), 6_000);
    }
}
