//! Polling core: watch state and the rate-limited watcher loop.
//!
//! ## Contents
//! - [`WatchState`] watermarks, first-run flag, rate-limit bookkeeping
//! - [`Watcher`] generic loop driving a [`Poll`] implementation
//!
//! ```text
//! Watcher::run ──► state.remaining_wait() ──► sleep (cancellable)
//!              └─► state.mark_call() ──► Poll::poll(&mut state)
//!                                            ├─ Ok  ──► loop
//!                                            └─ Err ──► log + backoff ──► loop
//! ```

mod state;
mod watcher;

pub use state::WatchState;
pub use watcher::{DEFAULT_ERROR_BACKOFF, Poll, Watcher};
