//! Small value types shared across modules: a monotonic clock abstraction
//! and the timeout queue the event loop blocks against.
use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    time::{Duration, Instant},
};

/// An opaque identifier for a scheduled [`Timeout`], handed back by
/// [`Timeouts::schedule`] so the caller can cancel it later (e.g. a key
/// chain reset timer that should be dropped if the chain completes first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeoutId(u64);

struct Timeout<T> {
    id: TimeoutId,
    at: Instant,
    payload: T,
}

impl<T> PartialEq for Timeout<T> {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at
    }
}
impl<T> Eq for Timeout<T> {}

impl<T> PartialOrd for Timeout<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Timeout<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so that `BinaryHeap`, a max-heap, pops the *soonest*
        // expiring timeout first.
        other.at.cmp(&self.at)
    }
}

/// A priority queue of pending timeouts, ordered by expiry. The event loop
/// consults this each iteration to compute how long it may block on the
/// X11 file descriptor for.
#[derive(Default)]
pub struct Timeouts<T> {
    heap: BinaryHeap<Timeout<T>>,
    next_id: u64,
}

impl<T> Timeouts<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_id: 0,
        }
    }

    /// Schedule `payload` to fire after `delay`.
    pub fn schedule(&mut self, delay: Duration, payload: T) -> TimeoutId {
        let id = TimeoutId(self.next_id);
        self.next_id += 1;
        self.heap.push(Timeout {
            id,
            at: Instant::now() + delay,
            payload,
        });
        id
    }

    /// Cancel a previously scheduled timeout. No-op if it already fired or
    /// was already cancelled.
    pub fn cancel(&mut self, id: TimeoutId) {
        // BinaryHeap has no O(log n) removal by key: rebuild without the
        // cancelled entry. Timeout queues in this core are small (key
        // chain resets, focus-steal windows) so this is not on a hot path.
        let remaining: Vec<_> = self.heap.drain().filter(|t| t.id != id).collect();
        self.heap.extend(remaining);
    }

    /// Duration until the next timeout expires, or `None` if the queue is
    /// empty. The event loop blocks on its file descriptor for at most
    /// this long.
    pub fn next_wait(&self) -> Option<Duration> {
        self.heap
            .peek()
            .map(|t| t.at.saturating_duration_since(Instant::now()))
    }

    /// Pop and return the payload of the next timeout if it is already due.
    pub fn pop_due(&mut self) -> Option<T> {
        if self.heap.peek()?.at <= Instant::now() {
            self.heap.pop().map(|t| t.payload)
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<T> PartialEq for TimeoutId {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_due_returns_none_before_expiry() {
        let mut t: Timeouts<&str> = Timeouts::new();
        t.schedule(Duration::from_secs(60), "late");
        assert_eq!(t.pop_due(), None);
    }

    #[test]
    fn pop_due_returns_expired_immediately_scheduled_entry() {
        let mut t: Timeouts<&str> = Timeouts::new();
        t.schedule(Duration::from_millis(0), "now");
        std::thread::sleep(Duration::from_millis(1));
        assert_eq!(t.pop_due(), Some("now"));
    }

    #[test]
    fn next_wait_tracks_the_soonest_timeout() {
        let mut t: Timeouts<&str> = Timeouts::new();
        t.schedule(Duration::from_secs(10), "slow");
        t.schedule(Duration::from_millis(1), "fast");

        let wait = t.next_wait().unwrap();
        assert!(wait < Duration::from_secs(1));
    }

    #[test]
    fn cancel_removes_the_timeout() {
        let mut t: Timeouts<&str> = Timeouts::new();
        let id = t.schedule(Duration::from_millis(0), "cancel-me");
        t.cancel(id);
        std::thread::sleep(Duration::from_millis(1));
        assert_eq!(t.pop_due(), None);
    }
}
