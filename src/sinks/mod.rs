//! # Output sinks.
//!
//! This module provides the [`Sink`] trait, the built-in sinks and the
//! [`SinkFanout`] that managers use to deliver envelopes.
//!
//! ## Architecture
//! ```text
//! ResourceManager ── write_event(&Envelope) ──► SinkFanout (one per manager)
//!                                                   │
//!                                        ┌──────────┴──────────┐
//!                                        ▼                     ▼
//!                                  StreamSink(stdout)      FileSink
//!                                  (shared by all managers, own lock each)
//! ```
//!
//! ## Implementing custom sinks
//! ```no_run
//! use nomad_event_logger::{Envelope, Sink, SinkError};
//! use async_trait::async_trait;
//!
//! struct Discard;
//!
//! #[async_trait]
//! impl Sink for Discard {
//!     async fn write(&self, _envelope: &Envelope) -> Result<(), SinkError> {
//!         Ok(())
//!     }
//!
//!     async fn close(&self) -> Result<(), SinkError> {
//!         Ok(())
//!     }
//! }
//! ```

mod fanout;
mod file;
mod sink;
mod stream;

pub use fanout::{Delivery, SinkFanout};
pub use file::FileSink;
pub use sink::{Sink, SinkKind, SinkRef};
pub use stream::StreamSink;
