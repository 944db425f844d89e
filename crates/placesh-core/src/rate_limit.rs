//! Per-user placement cooldown.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Outcome of asking whether a user may place a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Allowed,
    /// The user placed too recently and must wait `remaining` longer.
    Rejected { remaining: Duration },
}

impl Placement {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Placement::Allowed)
    }
}

/// Tracks when each user last placed a pixel and enforces a fixed cooldown.
///
/// Time is passed in by the caller as a monotonic [`Instant`]. Entries are
/// never evicted.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    cooldown: Duration,
    last_placed: HashMap<String, Instant>,
}

impl RateLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_placed: HashMap::new(),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Check whether `user` may place at `now` without changing any state.
    ///
    /// A `now` earlier than the recorded placement counts as no time elapsed.
    pub fn try_place(&self, user: &str, now: Instant) -> Placement {
        let Some(&last) = self.last_placed.get(user) else {
            return Placement::Allowed;
        };
        let elapsed = now.saturating_duration_since(last);
        if elapsed >= self.cooldown {
            Placement::Allowed
        } else {
            Placement::Rejected {
                remaining: self.cooldown - elapsed,
            }
        }
    }

    /// Record an accepted placement by `user` at `now`.
    pub fn record(&mut self, user: &str, now: Instant) {
        match self.last_placed.get_mut(user) {
            Some(last) => *last = now,
            None => {
                self.last_placed.insert(user.to_string(), now);
            }
        }
    }

    /// Check and, if allowed, record the placement in one step.
    pub fn try_acquire(&mut self, user: &str, now: Instant) -> Placement {
        let placement = self.try_place(user, now);
        if placement.is_allowed() {
            self.record(user, now);
        }
        placement
    }

    /// Time of the last accepted placement by `user`.
    pub fn last_placed(&self, user: &str) -> Option<Instant> {
        self.last_placed.get(user).copied()
    }

    /// Number of users with at least one accepted placement.
    pub fn len(&self) -> usize {
        self.last_placed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_placed.is_empty()
    }
}
