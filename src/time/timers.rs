//! Deterministic timer queue
//!
//! Stand-in for `setTimeout`/`setInterval` in a single-threaded event loop.
//! Timers are ordered by `(due_at, id)`, so two timers due at the same instant
//! fire in scheduling order. Nothing fires on its own: the owner calls
//! [`TimerQueue::pop_due`] with the current time.

use std::collections::BTreeMap;

/// Identifier handed out for every scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// Queue of pending timers tagged with a kind `K`
#[derive(Debug, Clone)]
pub struct TimerQueue<K> {
    pending: BTreeMap<(u64, TimerId), K>,
    next_id: u64,
}

impl<K: PartialEq> TimerQueue<K> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Schedule `kind` to fire at `due_at`, alongside any existing timer of the same kind
    pub fn schedule(&mut self, kind: K, due_at: u64) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.insert((due_at, id), kind);
        id
    }

    /// Debounce: cancel any pending timer equal to `kind`, then schedule it again.
    ///
    /// Returns true when an earlier timer was replaced.
    pub fn reschedule(&mut self, kind: K, due_at: u64) -> bool {
        let replaced = self.cancel(&kind);
        self.schedule(kind, due_at);
        replaced
    }

    /// Cancel every pending timer equal to `kind`
    pub fn cancel(&mut self, kind: &K) -> bool {
        let before = self.pending.len();
        self.pending.retain(|_, k| k != kind);
        self.pending.len() != before
    }

    /// Cancel every pending timer matching `predicate` and return them in due order
    pub fn drain_matching(&mut self, predicate: impl Fn(&K) -> bool) -> Vec<K> {
        let keys: Vec<(u64, TimerId)> = self
            .pending
            .iter()
            .filter(|(_, k)| predicate(k))
            .map(|(key, _)| *key)
            .collect();

        keys.into_iter()
            .filter_map(|key| self.pending.remove(&key))
            .collect()
    }

    /// Drop every pending timer
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Remove and return the earliest timer due at or before `now`
    pub fn pop_due(&mut self, now: u64) -> Option<(u64, K)> {
        let key = *self.pending.keys().next()?;
        if key.0 > now {
            return None;
        }
        self.pending.remove(&key).map(|kind| (key.0, kind))
    }

    /// Whether a timer equal to `kind` is pending
    pub fn is_pending(&self, kind: &K) -> bool {
        self.pending.values().any(|k| k == kind)
    }

    /// Instant of the earliest pending timer
    pub fn next_due(&self) -> Option<u64> {
        self.pending.keys().next().map(|(due, _)| *due)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<K: PartialEq> Default for TimerQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Kind {
        Debounce(&'static str),
        Tick,
    }

    #[test]
    fn test_pop_due_respects_time() {
        let mut timers = TimerQueue::new();
        timers.schedule(Kind::Tick, 100);

        assert!(timers.pop_due(99).is_none());
        assert_eq!(timers.pop_due(100), Some((100, Kind::Tick)));
        assert!(timers.is_empty());
    }

    #[test]
    fn test_same_instant_fires_in_schedule_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(Kind::Debounce("b"), 50);
        timers.schedule(Kind::Debounce("a"), 50);

        assert_eq!(timers.pop_due(50), Some((50, Kind::Debounce("b"))));
        assert_eq!(timers.pop_due(50), Some((50, Kind::Debounce("a"))));
    }

    #[test]
    fn test_reschedule_keeps_single_timer_per_kind() {
        let mut timers = TimerQueue::new();
        assert!(!timers.reschedule(Kind::Debounce("email"), 100));
        assert!(timers.reschedule(Kind::Debounce("email"), 300));
        timers.reschedule(Kind::Debounce("name"), 200);

        assert_eq!(timers.len(), 2);
        assert_eq!(timers.next_due(), Some(200));
        assert!(timers.pop_due(150).is_none());
    }

    #[test]
    fn test_drain_matching_returns_due_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(Kind::Debounce("late"), 900);
        timers.schedule(Kind::Tick, 10);
        timers.schedule(Kind::Debounce("early"), 400);

        let drained = timers.drain_matching(|k| matches!(k, Kind::Debounce(_)));
        assert_eq!(drained, vec![Kind::Debounce("early"), Kind::Debounce("late")]);
        assert_eq!(timers.len(), 1);
        assert!(timers.is_pending(&Kind::Tick));
    }

    #[test]
    fn test_cancel_missing_timer_is_noop() {
        let mut timers: TimerQueue<Kind> = TimerQueue::default();
        assert!(!timers.cancel(&Kind::Tick));
        timers.clear();
        assert!(timers.next_due().is_none());
    }
}
