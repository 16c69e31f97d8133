//! Quiet-period timing for autosave.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock backed by `Instant::now`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for deterministic timing.
///
/// Clones share the same offset, so a test can keep one handle and give
/// another to the store.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }
}

/// A single restartable deadline.
///
/// Every `restart` pushes the deadline to `now + window`; the deadline fires
/// once and must be restarted to fire again.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn restart(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Disarms and returns true if the deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restart_pushes_deadline() {
        let clock = ManualClock::new();
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        debouncer.restart(clock.now());

        clock.advance(Duration::from_millis(60));
        debouncer.restart(clock.now());
        clock.advance(Duration::from_millis(60));
        assert!(!debouncer.take_due(clock.now()));

        clock.advance(Duration::from_millis(40));
        assert!(debouncer.take_due(clock.now()));
        assert!(!debouncer.take_due(clock.now()));
        assert!(!debouncer.is_armed());
    }

    #[test]
    fn cancel_disarms() {
        let clock = ManualClock::new();
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        debouncer.restart(clock.now());
        debouncer.cancel();
        clock.advance(Duration::from_secs(1));
        assert!(!debouncer.take_due(clock.now()));
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance(Duration::from_millis(5));
        assert_eq!(other.elapsed(), Duration::from_millis(5));
        assert_eq!(clock.now(), other.now());
    }
}
