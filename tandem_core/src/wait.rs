// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Suspend-until-predicate waits.
//!
//! The controller never blocks. A wait is a value: an [`Await`] records
//! what it is waiting for, the [`Generation`] it was issued under, and an
//! optional deadline. Each [`Synchronizer::tick`](crate::sync::Synchronizer::tick)
//! polls the pending waits with the live generation and the current time.
//!
//! A command that supersedes earlier ones (a new seek, a quality switch)
//! bumps the generation. Every wait issued before that point then polls as
//! [`Poll::Stale`] and is dropped without touching an element. This is the
//! only cancellation mechanism.

use crate::time::{Duration, HostTime};

/// Monotonic command epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Returns the next generation.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Raw value, for trace output.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Outcome of polling an [`Await`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Poll {
    /// The condition does not hold yet.
    Pending,
    /// The condition holds.
    Ready,
    /// A newer command superseded the wait.
    Stale,
    /// The deadline passed before the condition held.
    TimedOut,
}

/// A pending wait for condition `C`.
#[derive(Clone, Debug)]
pub struct Await<C> {
    condition: C,
    generation: Generation,
    started: HostTime,
    deadline: Option<HostTime>,
}

impl<C> Await<C> {
    /// Starts waiting for `condition` under `generation`.
    #[must_use]
    pub fn new(condition: C, generation: Generation, now: HostTime) -> Self {
        Self {
            condition,
            generation,
            started: now,
            deadline: None,
        }
    }

    /// Gives up after `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = self.started.checked_add(timeout);
        self
    }

    /// The condition being waited for.
    #[must_use]
    pub fn condition(&self) -> &C {
        &self.condition
    }

    /// Mutable access to the condition, for recording progress.
    pub fn condition_mut(&mut self) -> &mut C {
        &mut self.condition
    }

    /// Generation the wait belongs to.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Time the wait began.
    #[must_use]
    pub fn started(&self) -> HostTime {
        self.started
    }

    /// Polls the wait.
    ///
    /// Staleness is checked first, then the predicate, then the deadline, so
    /// a condition that becomes true exactly at the deadline counts as ready.
    pub fn poll(&self, live: Generation, now: HostTime, predicate: impl FnOnce(&C) -> bool) -> Poll {
        if self.generation != live {
            return Poll::Stale;
        }
        if predicate(&self.condition) {
            return Poll::Ready;
        }
        match self.deadline {
            Some(deadline) if now >= deadline => Poll::TimedOut,
            _ => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_wins_over_ready() {
        let g = Generation::default();
        let w = Await::new("seek", g, HostTime::from_millis(0));
        assert_eq!(w.poll(g.next(), HostTime::from_millis(1), |_| true), Poll::Stale);
        assert_eq!(w.poll(g, HostTime::from_millis(1), |_| true), Poll::Ready);
    }

    #[test]
    fn deadline_applies_only_when_set() {
        let g = Generation::default();
        let open = Await::new((), g, HostTime::from_millis(0));
        assert_eq!(open.poll(g, HostTime(u64::MAX), |()| false), Poll::Pending);

        let bounded = Await::new((), g, HostTime::from_millis(10)).with_timeout(Duration::from_millis(5));
        assert_eq!(bounded.poll(g, HostTime::from_millis(14), |()| false), Poll::Pending);
        assert_eq!(bounded.poll(g, HostTime::from_millis(15), |()| false), Poll::TimedOut);
        assert_eq!(bounded.poll(g, HostTime::from_millis(15), |()| true), Poll::Ready);
    }

    #[test]
    fn predicate_sees_condition() {
        let g = Generation::default().next();
        let w = Await::new(3.5_f64, g, HostTime(0));
        assert_eq!(w.poll(g, HostTime(0), |t| *t > 3.0), Poll::Ready);
        assert_eq!(w.generation().get(), 1);
    }
}
