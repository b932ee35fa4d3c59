//! # Envelope: the unit delivered to every sink.
//!
//! An [`Envelope`] carries the capture time, an [`EventType`] tag and an opaque
//! JSON payload. It is immutable once built; sinks only read it.
//!
//! ## Example
//! ```rust
//! use nomad_event_logger::{Envelope, EventType};
//! use serde_json::json;
//!
//! let ev = Envelope::now(EventType::Job, json!({"ID": "web", "ModifyIndex": 9}));
//! assert_eq!(ev.kind(), EventType::Job);
//!
//! let line = ev.to_json().unwrap();
//! assert!(line.contains(r#""type":"job""#));
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

/// Classification of envelopes (and of the event types a user can monitor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Allocation,
    Evaluation,
    Node,
    Job,
    Deployment,
    /// Per-task state transitions, extracted from allocations.
    Task,
}

impl EventType {
    /// Every event type, in the order managers are created.
    pub const ALL: [EventType; 6] = [
        EventType::Allocation,
        EventType::Evaluation,
        EventType::Node,
        EventType::Job,
        EventType::Deployment,
        EventType::Task,
    ];

    /// Stable lowercase name used on the wire and in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Allocation => "allocation",
            EventType::Evaluation => "evaluation",
            EventType::Node => "node",
            EventType::Job => "job",
            EventType::Deployment => "deployment",
            EventType::Task => "task",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| ConfigError::UnknownEventType(s.to_string()))
    }
}

/// Timestamped, typed wrapper around a resource payload.
///
/// Serializes as `{"time": <RFC3339>, "type": <tag>, "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    time: DateTime<Utc>,
    #[serde(rename = "type")]
    kind: EventType,
    data: Value,
}

impl Envelope {
    /// Creates an envelope stamped with the current time.
    pub fn now(kind: EventType, data: Value) -> Self {
        Self::at(Utc::now(), kind, data)
    }

    /// Creates an envelope with an explicit capture time.
    pub fn at(time: DateTime<Utc>, kind: EventType, data: Value) -> Self {
        Self { time, kind, data }
    }

    /// Serializes `record` into the payload and stamps the current time.
    pub fn from_record<T: Serialize>(kind: EventType, record: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::now(kind, serde_json::to_value(record)?))
    }

    #[inline]
    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    #[inline]
    pub fn kind(&self) -> EventType {
        self.kind
    }

    #[inline]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Encodes the envelope as a single JSON line (without the trailing newline).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
