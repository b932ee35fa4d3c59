//! Event envelopes delivered to sinks.
//!
//! ## Contents
//! - [`EventType`] closed set of envelope tags
//! - [`Envelope`] timestamped, typed wrapper around a resource payload
//! - [`TaskComposite`] flattened allocation + task payload used for `task` envelopes
//!
//! ## Wire format
//! One JSON object per line:
//! ```text
//! {"time":"2022-01-01T00:00:00Z","type":"job","data":{...}}
//! ```

mod envelope;
mod task;

pub use envelope::{Envelope, EventType};
pub use task::{TaskComposite, TaskInfo};
