//! # Watcher: rate-limited retry loop shared by every resource manager.
//!
//! ## States
//! ```text
//!            ┌──────────────────────────────────────────────┐
//!            ▼                                              │
//!  ──► Idle (rate-limit wait) ──► Polling ──► Ok  ──────────┤
//!                                     │                     │
//!                                     └──► Err ──► Backoff ─┘
//!
//!  any state ──(token cancelled)──► Stopped
//! ```
//!
//! ## Rules
//! - Polls run **sequentially** (never concurrent within one watcher).
//! - `last_call_time` is recorded right **before** each poll.
//! - Poll errors are logged and followed by a fixed backoff delay
//!   ([`DEFAULT_ERROR_BACKOFF`] unless configured); they never stop the loop.
//! - Cancellation is checked at the top of each iteration and ends the
//!   rate-limit and backoff sleeps early. An in-flight poll is **not**
//!   interrupted, so shutdown may wait up to the poll's wait bound.

use std::time::Duration;

use async_trait::async_trait;
use tokio::{select, time, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::WatchState;
use crate::error::ClientError;

/// Delay applied before retrying a failed poll.
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// One poll cycle: query, filter against `state`, emit.
#[async_trait]
pub trait Poll: Send {
    async fn poll(&mut self, state: &mut WatchState) -> Result<(), ClientError>;
}

/// Drives a [`Poll`] implementation until cancelled.
#[derive(Debug, Clone, Copy)]
pub struct Watcher {
    backoff: Duration,
}

impl Default for Watcher {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_BACKOFF)
    }
}

impl Watcher {
    /// `backoff` is the sleep after every failed poll.
    pub fn new(backoff: Duration) -> Self {
        Self { backoff }
    }

    /// Runs the loop until `token` is cancelled.
    pub async fn run<P>(&self, poller: &mut P, state: &mut WatchState, token: &CancellationToken)
    where
        P: Poll + ?Sized,
    {
        let mut failures: u32 = 0;

        loop {
            if token.is_cancelled() {
                break;
            }

            let now = Instant::now();
            if let Some(wait) = state.remaining_wait(now) {
                select! {
                    _ = time::sleep(wait) => {}
                    _ = token.cancelled() => { break; }
                }
                continue;
            }

            state.mark_call(now);
            match poller.poll(state).await {
                Ok(()) => {
                    failures = 0;
                }
                Err(e) => {
                    let delay = self.backoff;
                    failures = failures.saturating_add(1);
                    error!(
                        error = %e,
                        label = e.as_label(),
                        attempt = failures,
                        delay_ms = delay.as_millis() as u64,
                        "watcher error, retrying after backoff"
                    );

                    select! {
                        _ = time::sleep(delay) => {}
                        _ = token.cancelled() => { break; }
                    }
                }
            }
        }
        debug!(
            last_index = state.last_index(),
            last_seen_time = state.last_seen_time(),
            "watcher stopped"
        );
    }
}
