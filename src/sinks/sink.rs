//! # Core sink trait
//!
//! `Sink` is the extension point for output destinations. One sink instance may
//! be shared by every resource manager, so implementations serialize their own
//! writes: two concurrent `write` calls must never interleave their output.
//!
//! ## Example (skeleton)
//! ```rust
//! // use nomad_event_logger::{Envelope, Sink, SinkError};
//! //
//! // struct Audit;
//! // #[async_trait::async_trait]
//! // impl Sink for Audit {
//! //     async fn write(&self, envelope: &Envelope) -> Result<(), SinkError> {
//! //         // ship the envelope somewhere...
//! //         Ok(())
//! //     }
//! //     async fn close(&self) -> Result<(), SinkError> { Ok(()) }
//! //     fn name(&self) -> &'static str { "audit" }
//! // }
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use crate::error::{ConfigError, SinkError};
use crate::events::Envelope;

/// Contract for event output destinations.
#[async_trait]
pub trait Sink: Send + Sync + 'static {
    /// Delivers one envelope. Must be safe to call concurrently.
    async fn write(&self, envelope: &Envelope) -> Result<(), SinkError>;

    /// Releases the destination. Called once at shutdown.
    async fn close(&self) -> Result<(), SinkError>;

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a sink.
pub type SinkRef = Arc<dyn Sink>;

/// Sink types selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Stdout,
    File,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Stdout => "stdout",
            SinkKind::File => "file",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SinkKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "stdout" => Ok(SinkKind::Stdout),
            "file" => Ok(SinkKind::File),
            other => Err(ConfigError::UnknownSink(other.to_string())),
        }
    }
}
