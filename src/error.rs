//! Error types used by the agent, its resource managers and sinks.
//!
//! Each concern gets its own enum:
//!
//! - [`ConfigError`]: invalid or unreadable configuration (fatal, before startup).
//! - [`ClientError`]: a failed list query against the cluster API (transient, retried).
//! - [`SinkError`]: a failed write/close on an output sink (logged, never propagated).
//! - [`ManagerError`]: lifecycle misuse of a resource manager.
//! - [`RuntimeError`]: errors surfaced by the agent itself.
//!
//! All of them provide `as_label()` for logs.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::client::ResourceKind;
use crate::events::EventType;

/// # Errors raised while loading or validating configuration.
///
/// These are always fatal and are reported before any manager starts.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No cluster address was provided.
    #[error("nomad address is required")]
    MissingAddress,

    /// The sink list is empty.
    #[error("at least one sink must be specified")]
    NoSinks,

    /// A sink name outside the supported set.
    #[error("unknown sink type: {0}")]
    UnknownSink(String),

    /// An event type name outside the supported set.
    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    /// A file sink was requested without a path.
    #[error("file path is required when using file sink")]
    MissingFilePath,

    /// A duration value could not be parsed or is out of range.
    #[error("invalid duration {input:?}: {reason}")]
    InvalidDuration {
        /// The offending input.
        input: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The config file could not be read.
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`Config`](crate::Config).
    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::MissingAddress => "config_missing_address",
            ConfigError::NoSinks => "config_no_sinks",
            ConfigError::UnknownSink(_) => "config_unknown_sink",
            ConfigError::UnknownEventType(_) => "config_unknown_event_type",
            ConfigError::MissingFilePath => "config_missing_file_path",
            ConfigError::InvalidDuration { .. } => "config_invalid_duration",
            ConfigError::Read { .. } => "config_read",
            ConfigError::Parse { .. } => "config_parse",
        }
    }
}

/// # Errors produced by a cluster list query.
///
/// The watcher loop treats every variant as transient: it logs, backs off and retries.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ClientError {
    /// The configured address is not a usable base URL.
    #[error("invalid nomad address {addr:?}: {reason}")]
    InvalidAddress { addr: String, reason: String },

    /// Transport-level failure (connect, timeout, body read).
    #[error("failed to get {kind}: {source}")]
    Http {
        kind: ResourceKind,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("failed to get {kind}: unexpected status {status}")]
    Status { kind: ResourceKind, status: u16 },

    /// The response body was not a list of records.
    #[error("failed to decode {kind} listing: {reason}")]
    Decode { kind: ResourceKind, reason: String },
}

impl ClientError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ClientError::InvalidAddress { .. } => "client_invalid_address",
            ClientError::Http { .. } => "client_http",
            ClientError::Status { .. } => "client_status",
            ClientError::Decode { .. } => "client_decode",
        }
    }
}

/// # Errors produced by sinks.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SinkError {
    /// The envelope could not be serialized.
    #[error("failed to marshal event: {0}")]
    Encode(#[from] serde_json::Error),

    /// The underlying writer failed.
    #[error("failed to write event: {0}")]
    Io(#[from] std::io::Error),

    /// The output file could not be opened.
    #[error("failed to open file {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The sink was already closed.
    #[error("sink is closed")]
    Closed,
}

impl SinkError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SinkError::Encode(_) => "sink_encode",
            SinkError::Io(_) => "sink_io",
            SinkError::Open { .. } => "sink_open",
            SinkError::Closed => "sink_closed",
        }
    }
}

/// # Errors produced by the resource-manager lifecycle.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ManagerError {
    /// `start` was called on a manager whose loop was already launched.
    #[error("{event_type} manager already started")]
    AlreadyStarted { event_type: EventType },

    /// The manager loop panicked or was aborted.
    #[error("{event_type} manager loop terminated abnormally: {reason}")]
    Join {
        event_type: EventType,
        reason: String,
    },
}

impl ManagerError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ManagerError::AlreadyStarted { .. } => "manager_already_started",
            ManagerError::Join { .. } => "manager_join",
        }
    }
}

/// # Errors raised by the agent runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration was rejected while building the agent.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A configured sink could not be created.
    #[error("failed to create sink: {0}")]
    Sink(#[from] SinkError),

    /// The cluster client could not be created.
    #[error("failed to create nomad client: {0}")]
    Client(#[from] ClientError),

    /// Shutdown grace period was exceeded; the listed managers were aborted.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Event types of the managers that did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use nomad_event_logger::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Config(_) => "runtime_config",
            RuntimeError::Sink(_) => "runtime_sink",
            RuntimeError::Client(_) => "runtime_client",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}
