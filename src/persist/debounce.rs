//! Deadline debouncer polled by the host loop.

use std::time::{Duration, Instant};

/// Default coalescing window for settings writes.
pub const PERSIST_DEBOUNCE: Duration = Duration::from_millis(150);

/// Coalesces bursts of requests into one action after a quiet period.
///
/// Every [`schedule`](Self::schedule) pushes the deadline out by `delay`;
/// [`take_due`](Self::take_due) fires once the deadline has passed. A request
/// made without a clock reading starts its quiet period at the next
/// `take_due`.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: bool,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: false,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Restart the quiet period at `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.pending = true;
        self.deadline = Some(now + self.delay);
    }

    /// Request an action when the current time is unknown.
    pub fn schedule_unanchored(&mut self) {
        self.pending = true;
        self.deadline = None;
    }

    pub fn cancel(&mut self) {
        self.pending = false;
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Clear and report a pending deadline that has passed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        if !self.pending {
            return false;
        }
        let deadline = *self.deadline.get_or_insert(now + self.delay);
        if deadline <= now {
            self.cancel();
            true
        } else {
            false
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(PERSIST_DEBOUNCE)
    }
}
