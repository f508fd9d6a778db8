//! Deferred event scheduling for the single-threaded poll loop
//!
//! The wheel holds tagged events ordered by deadline. The owner of the wheel
//! drives it from its poll loop with [`TimerWheel::tick`], handing in a
//! dispatcher that receives each due event together with the wheel itself, so
//! a handler is free to schedule or cancel more timers while it runs.

use log::warn;
use std::collections::VecDeque;
use std::fmt::Display;
use std::time::{Duration, Instant};

/// Cancellable reference to a scheduled event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    id: u64,
    deadline: Instant,
}

impl TimerHandle {
    /// When the event is (or was) due
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

#[derive(Debug)]
struct Entry<E> {
    id: u64,
    deadline: Instant,
    event: E,
}

/// Deadline-ordered queue of pending events
#[derive(Debug)]
pub struct TimerWheel<E> {
    /// Pending entries, ascending by deadline, FIFO among equal deadlines
    entries: VecDeque<Entry<E>>,
    next_id: u64,
}

impl<E> TimerWheel<E> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            next_id: 0,
        }
    }

    /// Schedule `event` to fire `delay` after `now`
    pub fn schedule(&mut self, now: Instant, delay: Duration, event: E) -> TimerHandle {
        let deadline = now + delay;
        let id = self.next_id;
        self.next_id += 1;

        let pos = self.entries.partition_point(|e| e.deadline <= deadline);
        self.entries.insert(pos, Entry { id, deadline, event });

        TimerHandle { id, deadline }
    }

    /// Remove a pending timer. Cancelling a fired or cancelled handle does nothing.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.entries.iter().position(|e| e.id == handle.id) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Whether the timer behind `handle` has neither fired nor been cancelled
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.id == handle.id)
    }

    /// Deadline of the earliest pending timer
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.front().map(|e| e.deadline)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every pending timer whose event does not satisfy `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(&E) -> bool) {
        self.entries.retain(|e| keep(&e.event));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Fire every timer due at `now`, earliest first.
    ///
    /// Each entry is detached before `dispatch` runs. Timers scheduled by a
    /// handler during this call wait for the next tick even when already due,
    /// so a handler that re-arms itself with a zero delay cannot spin. A
    /// handler error is logged and the remaining timers still fire.
    ///
    /// Returns the number of timers fired.
    pub fn tick<F, Err>(&mut self, now: Instant, mut dispatch: F) -> usize
    where
        F: FnMut(&mut Self, E) -> Result<(), Err>,
        Err: Display,
    {
        let limit = self.next_id;
        let mut fired = 0;

        loop {
            let due = self
                .entries
                .front()
                .is_some_and(|e| e.deadline <= now && e.id < limit);
            if !due {
                break;
            }
            let Some(entry) = self.entries.pop_front() else {
                break;
            };

            fired += 1;
            if let Err(e) = dispatch(self, entry.event) {
                warn!("timer {} failed: {}", entry.id, e);
            }
        }

        fired
    }
}

impl<E> Default for TimerWheel<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn collect(wheel: &mut TimerWheel<&'static str>, now: Instant) -> Vec<&'static str> {
        let mut fired = Vec::new();
        wheel.tick(now, |_, event| -> Result<(), String> {
            fired.push(event);
            Ok(())
        });
        fired
    }

    #[test]
    fn fires_in_deadline_order() {
        let t0 = Instant::now();
        let mut wheel = TimerWheel::new();
        wheel.schedule(t0, ms(30), "c");
        wheel.schedule(t0, ms(10), "a");
        wheel.schedule(t0, ms(20), "b");

        assert_eq!(collect(&mut wheel, t0 + ms(100)), vec!["a", "b", "c"]);
        assert!(wheel.is_empty());
    }

    #[test]
    fn equal_deadlines_fire_fifo() {
        let t0 = Instant::now();
        let mut wheel = TimerWheel::new();
        wheel.schedule(t0, ms(10), "first");
        wheel.schedule(t0, ms(10), "second");
        wheel.schedule(t0, ms(10), "third");

        assert_eq!(
            collect(&mut wheel, t0 + ms(10)),
            vec!["first", "second", "third"]
        );
    }

    #[test]
    fn only_due_timers_fire() {
        let t0 = Instant::now();
        let mut wheel = TimerWheel::new();
        wheel.schedule(t0, ms(10), "soon");
        wheel.schedule(t0, ms(500), "later");

        assert_eq!(collect(&mut wheel, t0 + ms(50)), vec!["soon"]);
        assert_eq!(wheel.len(), 1);
        assert_eq!(wheel.next_deadline(), Some(t0 + ms(500)));
    }

    #[test]
    fn cancel_removes_pending_and_is_idempotent() {
        let t0 = Instant::now();
        let mut wheel = TimerWheel::new();
        let handle = wheel.schedule(t0, ms(10), "x");
        assert!(wheel.is_pending(handle));

        assert!(wheel.cancel(handle));
        assert!(!wheel.cancel(handle));
        assert!(!wheel.is_pending(handle));
        assert!(collect(&mut wheel, t0 + ms(20)).is_empty());
    }

    #[test]
    fn cancel_after_fire_is_noop() {
        let t0 = Instant::now();
        let mut wheel = TimerWheel::new();
        let handle = wheel.schedule(t0, ms(10), "x");
        collect(&mut wheel, t0 + ms(10));

        assert!(!wheel.cancel(handle));
        assert_eq!(handle.deadline(), t0 + ms(10));
    }

    #[test]
    fn handler_may_reschedule_itself() {
        let t0 = Instant::now();
        let mut wheel = TimerWheel::new();
        wheel.schedule(t0, ms(10), 1u32);

        let now = t0 + ms(10);
        let fired = wheel.tick(now, |wheel, count| -> Result<(), String> {
            // Zero delay: due immediately, but must wait for the next tick
            wheel.schedule(now, Duration::ZERO, count + 1);
            Ok(())
        });

        assert_eq!(fired, 1);
        assert_eq!(wheel.len(), 1);

        let mut seen = Vec::new();
        wheel.tick(now, |_, count| -> Result<(), String> {
            seen.push(count);
            Ok(())
        });
        assert_eq!(seen, vec![2]);
    }

    #[test]
    fn handler_error_does_not_stop_other_timers() {
        let t0 = Instant::now();
        let mut wheel = TimerWheel::new();
        wheel.schedule(t0, ms(1), "bad");
        wheel.schedule(t0, ms(2), "good");

        let mut ok = Vec::new();
        let fired = wheel.tick(t0 + ms(5), |_, event| {
            if event == "bad" {
                return Err("client went away".to_string());
            }
            ok.push(event);
            Ok(())
        });

        assert_eq!(fired, 2);
        assert_eq!(ok, vec!["good"]);
    }

    #[test]
    fn retain_drops_matching_events() {
        let t0 = Instant::now();
        let mut wheel = TimerWheel::new();
        wheel.schedule(t0, ms(1), ("a", 1));
        wheel.schedule(t0, ms(2), ("b", 2));
        wheel.schedule(t0, ms(3), ("a", 3));

        wheel.retain(|(owner, _)| *owner != "a");
        assert_eq!(wheel.len(), 1);
        assert_eq!(wheel.next_deadline(), Some(t0 + ms(2)));
    }

    #[test]
    fn handler_may_cancel_a_later_timer() {
        let t0 = Instant::now();
        let mut wheel = TimerWheel::new();
        wheel.schedule(t0, ms(1), "canceller");
        let victim = wheel.schedule(t0, ms(2), "victim");

        let mut fired = Vec::new();
        wheel.tick(t0 + ms(5), |wheel, event| -> Result<(), String> {
            fired.push(event);
            if event == "canceller" {
                wheel.cancel(victim);
            }
            Ok(())
        });

        assert_eq!(fired, vec!["canceller"]);
    }
}
