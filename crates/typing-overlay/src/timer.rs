//! Timer handles for the cooperative scheduler timeline.
//!
//! Nothing here sleeps. Timers only record deadlines; whoever owns the
//! timeline asks for the earliest deadline, waits for it, and then asks the
//! timers which callbacks are due.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use tokio::time::Instant;

/// A fixed-period repeating timer.
///
/// `start` and `stop` are idempotent: starting a running timer keeps its
/// phase, stopping a stopped timer does nothing.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    period: Duration,
    next_fire: Option<Instant>,
}

impl IntervalTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_fire: None,
        }
    }

    /// Start the timer; the first fire is one period after `now`.
    pub fn start(&mut self, now: Instant) {
        if self.next_fire.is_none() {
            self.next_fire = Some(now + self.period);
        }
    }

    pub fn stop(&mut self) {
        self.next_fire = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_fire.is_some()
    }

    pub fn next_fire(&self) -> Option<Instant> {
        self.next_fire
    }

    /// If the timer is due at `now`, consume one fire and return its deadline.
    pub fn poll(&mut self, now: Instant) -> Option<Instant> {
        let due = self.next_fire.filter(|deadline| *deadline <= now)?;
        self.next_fire = Some(due + self.period);
        Some(due)
    }
}

/// A one-shot callback scheduled for a deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deferred<T> {
    pub deadline: Instant,
    seq: u64,
    pub task: T,
}

impl<T: Eq> Ord for Deferred<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.deadline, self.seq).cmp(&(other.deadline, other.seq))
    }
}

impl<T: Eq> PartialOrd for Deferred<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Fire-and-forget one-shot timers, released in deadline order.
///
/// Tasks with equal deadlines come out in scheduling order.
#[derive(Debug)]
pub struct DeferredQueue<T> {
    heap: BinaryHeap<Reverse<Deferred<T>>>,
    next_seq: u64,
}

impl<T: Eq> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<T: Eq> DeferredQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Instant, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Deferred {
            deadline,
            seq,
            task,
        }));
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|Reverse(d)| d.deadline)
    }

    /// Remove and return the earliest task if it is due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<Deferred<T>> {
        if self.next_deadline()? > now {
            return None;
        }
        self.heap.pop().map(|Reverse(d)| d)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
