//! Runtime core: agent construction, lifecycle and shutdown.
//!
//! The public API of this module is [`Agent`] and [`AgentBuilder`].
//!
//! Internal modules:
//! - [`builder`]: turns validated settings into managers and sinks;
//! - [`supervisor`]: starts managers, stops them within a grace period, closes sinks;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod shutdown;
mod supervisor;

pub use builder::AgentBuilder;
pub use supervisor::Agent;
