//! Cooperative timers driven by an externally supplied monotonic time.
//!
//! Nothing here sleeps or reads the wall clock: owners call
//! [`Scheduler::pop_due`] (or [`Scheduler::poll`]) with the current time and
//! react to whatever has come due. Every component owns its own scheduler, so
//! tearing a component down is a single [`Scheduler::cancel_all`].

use std::time::Duration;

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Timer<E> {
    id: TimerId,
    due: Duration,
    period: Option<Duration>,
    event: E,
}

/// A timer that came due.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<E> {
    pub id: TimerId,
    /// The instant the timer was due, which may be earlier than the poll time.
    pub at: Duration,
    pub event: E,
}

#[derive(Debug)]
pub struct Scheduler<E> {
    timers: Vec<Timer<E>>,
    next_id: u64,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 0,
        }
    }
}

impl<E: Clone> Scheduler<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires once at `due`.
    pub fn schedule_at(&mut self, due: Duration, event: E) -> TimerId {
        self.insert(due, None, event)
    }

    /// Fires once, `delay` after `now`.
    pub fn schedule_after(&mut self, now: Duration, delay: Duration, event: E) -> TimerId {
        self.insert(now + delay, None, event)
    }

    /// Fires every `period`, first at `now + period`. A zero period is
    /// treated as one millisecond so a poll always terminates.
    pub fn schedule_every(&mut self, now: Duration, period: Duration, event: E) -> TimerId {
        let period = period.max(Duration::from_millis(1));
        self.insert(now + period, Some(period), event)
    }

    /// Cancels a timer. Returns whether it was still pending; cancelling twice
    /// is harmless.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.id != id);
        before != self.timers.len()
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|timer| timer.id == id)
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    pub fn is_idle(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.timers.iter().map(|timer| timer.due).min()
    }

    /// Removes and returns the earliest timer due at or before `now`. Ties are
    /// broken by scheduling order. Interval timers are re-armed one period
    /// later, so a late poll replays every missed firing.
    pub fn pop_due(&mut self, now: Duration) -> Option<Fired<E>> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= now)
            .min_by_key(|(_, timer)| (timer.due, timer.id))
            .map(|(index, _)| index)?;

        let timer = &mut self.timers[index];
        let fired = Fired {
            id: timer.id,
            at: timer.due,
            event: timer.event.clone(),
        };

        match timer.period {
            Some(period) => timer.due += period,
            None => {
                self.timers.swap_remove(index);
            }
        }

        Some(fired)
    }

    /// Drains everything due at or before `now`, in firing order.
    pub fn poll(&mut self, now: Duration) -> Vec<Fired<E>> {
        let mut fired = Vec::new();
        while let Some(next) = self.pop_due(now) {
            fired.push(next);
        }
        fired
    }

    fn insert(&mut self, due: Duration, period: Option<Duration>, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            due,
            period,
            event,
        });
        id
    }
}

/// Lets exactly one event through, then stays closed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Latch {
    fired: bool,
}

impl Latch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` only on the first call.
    pub fn fire(&mut self) -> bool {
        !std::mem::replace(&mut self.fired, true)
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}
