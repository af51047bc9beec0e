//! # Time Sources
//!
//! The auction's phases are pure functions of "now". Where "now" comes from
//! is pluggable: production code reads the wall clock, tests and the
//! simulator drive a [`ManualClock`] by hand.
//!
//! A clock must never run backwards. Phase transitions are only monotonic
//! because the clock is.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use crate::types::Timestamp;

/// A source of the current timestamp.
pub trait Clock: Send + Sync {
    /// Current time in seconds since the UNIX epoch.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time via `chrono::Utc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        // Pre-epoch wall clocks are clamped to zero.
        u64::try_from(Utc::now().timestamp()).unwrap_or(0)
    }
}

/// A hand-cranked clock.
///
/// Clones share the same underlying time, so a test can hand one clone to
/// the auction and keep another to move time forward. Every mutator is
/// monotonic: asking to go back in time leaves the clock where it is.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Starts the clock at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Moves the clock forward by `secs`, saturating at `u64::MAX`.
    /// Returns the new time.
    pub fn advance(&self, secs: u64) -> Timestamp {
        let mut current = self.now.load(Ordering::SeqCst);
        loop {
            let next = current.saturating_add(secs);
            match self
                .now
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(observed) => current = observed,
            }
        }
    }

    /// Moves the clock to `target` if that is in the future. Returns the
    /// resulting time, which is `max(now, target)`.
    pub fn increase_to(&self, target: Timestamp) -> Timestamp {
        let previous = self.now.fetch_max(target, Ordering::SeqCst);
        previous.max(target)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
