//! Single-slot pacing scheduler.
//!
//! Holds at most one pending event with a countdown. The owner advances it
//! with [`Scheduler::tick`] (real time) or fires it immediately with
//! [`Scheduler::fire_now`] (headless runs). Delays are cosmetic; a zero delay
//! fires on the next tick.

use std::time::Duration;

/// A pending event and its remaining delay.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending<E> {
    event: E,
    remaining: Duration,
}

/// Cancellable one-shot timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduler<E> {
    pending: Option<Pending<E>>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<E: std::fmt::Debug> Scheduler<E> {
    /// Empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `event` after `delay`, replacing whatever was pending.
    pub fn schedule(&mut self, delay: Duration, event: E) {
        if let Some(previous) = &self.pending {
            tracing::warn!(replaced = ?previous.event, with = ?event, "Pending event replaced");
        }
        self.pending = Some(Pending {
            event,
            remaining: delay,
        });
    }

    /// Drop the pending event, returning it.
    pub fn cancel(&mut self) -> Option<E> {
        self.pending.take().map(|p| p.event)
    }

    /// Nothing is pending.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// The pending event, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&E> {
        self.pending.as_ref().map(|p| &p.event)
    }

    /// Time left before the pending event fires.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.pending.as_ref().map(|p| p.remaining)
    }

    /// Advance the countdown and return the event if it is due.
    pub fn tick(&mut self, elapsed: Duration) -> Option<E> {
        let pending = self.pending.as_mut()?;
        pending.remaining = pending.remaining.saturating_sub(elapsed);
        if pending.remaining.is_zero() {
            self.cancel()
        } else {
            None
        }
    }

    /// Fire the pending event regardless of its remaining delay.
    pub fn fire_now(&mut self) -> Option<E> {
        self.cancel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_delay() {
        let mut s = Scheduler::new();
        s.schedule(Duration::from_millis(300), 7u8);
        assert_eq!(s.tick(Duration::from_millis(100)), None);
        assert_eq!(s.remaining(), Some(Duration::from_millis(200)));
        assert_eq!(s.tick(Duration::from_millis(250)), Some(7));
        assert!(s.is_idle());
    }

    #[test]
    fn test_zero_delay_fires_on_next_tick() {
        let mut s = Scheduler::new();
        s.schedule(Duration::ZERO, "go");
        assert_eq!(s.tick(Duration::ZERO), Some("go"));
    }

    #[test]
    fn test_cancel_and_replace() {
        let mut s = Scheduler::new();
        s.schedule(Duration::from_secs(1), 1);
        s.schedule(Duration::from_secs(2), 2);
        assert_eq!(s.pending(), Some(&2));
        assert_eq!(s.cancel(), Some(2));
        assert_eq!(s.tick(Duration::from_secs(5)), None);
    }

    #[test]
    fn test_fire_now_ignores_delay() {
        let mut s = Scheduler::new();
        s.schedule(Duration::from_secs(60), 'x');
        assert_eq!(s.fire_now(), Some('x'));
        assert_eq!(s.fire_now(), None);
    }
}
