//! Cancellable scheduled tasks.
//!
//! [`Timers`] is a small deadline table. The owner schedules a task kind with
//! an absolute deadline, polls [`Timers::pop_expired`] from its tick handler,
//! and cancels by handle or by kind. Nothing fires on its own: a timer that is
//! cancelled, or whose owner is reset, is simply gone.

use crate::clock::Instant;

/// Handle to a scheduled task, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Entry<I, K> {
    handle: TimerHandle,
    deadline: I,
    kind: K,
}

/// Deadline table keyed by task kind.
///
/// Expired tasks are returned in deadline order. Tasks with equal deadlines
/// are returned in the order they were scheduled.
#[derive(Debug, Clone)]
pub struct Timers<I, K> {
    next_handle: u64,
    entries: Vec<Entry<I, K>>,
}

impl<I: Instant, K: Copy + PartialEq> Default for Timers<I, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Instant, K: Copy + PartialEq> Timers<I, K> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self { next_handle: 0, entries: Vec::new() }
    }

    /// Schedule `kind` to fire at `deadline`.
    pub fn schedule(&mut self, kind: K, deadline: I) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push(Entry { handle, deadline, kind });
        handle
    }

    /// Cancel a single task. Returns `false` if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    /// Cancel every task of the given kind. Returns how many were removed.
    pub fn cancel_kind(&mut self, kind: K) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.kind != kind);
        before - self.entries.len()
    }

    /// Cancel everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Whether a task of `kind` is scheduled.
    pub fn is_scheduled(&self, kind: K) -> bool {
        self.entries.iter().any(|e| e.kind == kind)
    }

    /// Earliest pending deadline. `None` if nothing is scheduled.
    pub fn next_deadline(&self) -> Option<I> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    /// Remove and return every task whose deadline is at or before `now`.
    pub fn pop_expired(&mut self, now: I) -> Vec<K> {
        let mut expired: Vec<Entry<I, K>> = Vec::new();
        let mut remaining = Vec::with_capacity(self.entries.len());

        for entry in self.entries.drain(..) {
            if entry.deadline <= now {
                expired.push(entry);
            } else {
                remaining.push(entry);
            }
        }
        self.entries = remaining;

        expired.sort_by(|a, b| a.deadline.cmp(&b.deadline).then(a.handle.0.cmp(&b.handle.0)));
        expired.into_iter().map(|e| e.kind).collect()
    }

    /// Number of scheduled tasks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant as StdInstant};

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Kind {
        A,
        B,
    }

    #[test]
    fn expired_in_deadline_order() {
        let t0 = StdInstant::now();
        let mut timers = Timers::new();
        timers.schedule(Kind::B, t0 + Duration::from_millis(200));
        timers.schedule(Kind::A, t0 + Duration::from_millis(100));

        assert!(timers.pop_expired(t0).is_empty());
        assert_eq!(timers.pop_expired(t0 + Duration::from_millis(250)), vec![Kind::A, Kind::B]);
        assert!(timers.is_empty());
    }

    #[test]
    fn only_due_tasks_fire() {
        let t0 = StdInstant::now();
        let mut timers = Timers::new();
        timers.schedule(Kind::A, t0 + Duration::from_millis(100));
        timers.schedule(Kind::B, t0 + Duration::from_secs(2));

        assert_eq!(timers.pop_expired(t0 + Duration::from_millis(100)), vec![Kind::A]);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.next_deadline(), Some(t0 + Duration::from_secs(2)));
    }

    #[test]
    fn cancel_by_handle_and_kind() {
        let t0 = StdInstant::now();
        let mut timers = Timers::new();
        let a = timers.schedule(Kind::A, t0);
        timers.schedule(Kind::B, t0);
        timers.schedule(Kind::B, t0);

        assert!(timers.cancel(a));
        assert!(!timers.cancel(a));
        assert_eq!(timers.cancel_kind(Kind::B), 2);
        assert!(timers.pop_expired(t0 + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn equal_deadlines_keep_schedule_order() {
        let t0 = StdInstant::now();
        let mut timers = Timers::new();
        timers.schedule(Kind::B, t0);
        timers.schedule(Kind::A, t0);

        assert_eq!(timers.pop_expired(t0), vec![Kind::B, Kind::A]);
    }
}
