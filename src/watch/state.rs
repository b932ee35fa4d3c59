//! # Per-manager watch state.
//!
//! [`WatchState`] is exclusively owned by one manager's loop and never persisted.
//!
//! ## Rules
//! - `last_index` and `last_seen_time` only move forward.
//! - `first_run` flips to `false` exactly once, after the first completed cycle.
//! - `last_call_time` is recorded **before** a poll starts, so poll duration
//!   counts toward the rate-limit window.

use std::time::Duration;

use tokio::time::Instant;

/// Watermarks and rate-limit bookkeeping for one resource manager.
#[derive(Debug, Clone)]
pub struct WatchState {
    last_index: u64,
    last_seen_time: i64,
    first_run: bool,
    rate_limit: Duration,
    last_call_time: Option<Instant>,
}

impl Default for WatchState {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl WatchState {
    /// Fresh state; `rate_limit == 0` means unlimited.
    pub fn new(rate_limit: Duration) -> Self {
        Self {
            last_index: 0,
            last_seen_time: 0,
            first_run: true,
            rate_limit,
            last_call_time: None,
        }
    }

    #[inline]
    pub fn last_index(&self) -> u64 {
        self.last_index
    }

    /// Latest task event time already processed (Unix nanoseconds).
    #[inline]
    pub fn last_seen_time(&self) -> i64 {
        self.last_seen_time
    }

    #[inline]
    pub fn is_first_run(&self) -> bool {
        self.first_run
    }

    #[inline]
    pub fn rate_limit(&self) -> Duration {
        self.rate_limit
    }

    /// Index filter: strictly greater than the watermark.
    #[inline]
    pub fn is_new_index(&self, modify_index: u64) -> bool {
        modify_index > self.last_index
    }

    /// Time filter: not earlier than the watermark.
    ///
    /// An event exactly at the watermark counts as new, so it can be emitted
    /// again on a later cycle while the watermark has not moved past it.
    #[inline]
    pub fn is_new_event_time(&self, time: i64) -> bool {
        time >= self.last_seen_time
    }

    /// Moves `last_index` forward; smaller values are ignored.
    pub fn advance_index(&mut self, index: u64) {
        if index > self.last_index {
            self.last_index = index;
        }
    }

    /// Moves `last_seen_time` forward; smaller values are ignored.
    pub fn advance_seen_time(&mut self, time: i64) {
        if time > self.last_seen_time {
            self.last_seen_time = time;
        }
    }

    /// Ends a poll cycle. Returns `true` only for the cycle that ended the first run.
    pub fn complete_cycle(&mut self) -> bool {
        std::mem::replace(&mut self.first_run, false)
    }

    /// Time left before the next poll may start, or `None` if it may start now.
    pub fn remaining_wait(&self, now: Instant) -> Option<Duration> {
        let last = self.last_call_time?;
        let elapsed = now.saturating_duration_since(last);
        (elapsed < self.rate_limit).then(|| self.rate_limit - elapsed)
    }

    /// Records the start of a poll.
    pub fn mark_call(&mut self, now: Instant) {
        self.last_call_time = Some(now);
    }
}
