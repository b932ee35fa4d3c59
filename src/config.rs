//! # Agent configuration.
//!
//! Configuration is layered: built-in [`Config::defaults`], then an optional
//! TOML file, then command-line flags and environment (`NOMAD_ADDR`,
//! `NOMAD_TOKEN`). Each layer is a partial [`Config`]; [`Config::merge`]
//! lets the later layer win field by field. [`Config::validate`] turns the
//! result into [`Settings`], the only form the agent accepts.
//!
//! # Example
//! ```
//! use nomad_event_logger::{Config, EventType, SinkKind};
//! use std::time::Duration;
//!
//! let file: Config = toml::from_str(r#"
//!     sinks = ["stdout", "file"]
//!     event_types = ["job", "task"]
//!     rate_limit = "2s"
//! "#).unwrap();
//!
//! let settings = Config::defaults().merge(file).validate().unwrap();
//! assert_eq!(settings.sinks, vec![SinkKind::Stdout, SinkKind::File]);
//! assert!(settings.event_types.contains(&EventType::Task));
//! assert_eq!(settings.rate_limit, Duration::from_secs(2));
//! ```
//!
//! ## Durations
//! `"500ms"`, `"5s"`, `"1m"`, `"1h"`, or a bare number of seconds (`"30"`).

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::client::DEFAULT_WAIT_TIME;
use crate::error::ConfigError;
use crate::events::EventType;
use crate::sinks::SinkKind;

pub const DEFAULT_NOMAD_ADDR: &str = "http://localhost:4646";
pub const DEFAULT_FILE_PATH: &str = "/tmp/nomad-events.json";
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_secs(5);
/// Longer than the poll bound so an in-flight query can finish on shutdown.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(60);
/// Nomad caps blocking queries at 10 minutes.
pub const MAX_WAIT_TIME: Duration = Duration::from_secs(600);

/// One partial configuration layer. `None` means "not set at this layer".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub nomad_addr: Option<String>,
    pub nomad_token: Option<String>,
    pub sinks: Option<Vec<String>>,
    /// Empty means every event type.
    pub event_types: Option<Vec<String>>,
    /// Minimum spacing between allocation polls.
    pub rate_limit: Option<String>,
    pub file_path: Option<PathBuf>,
    /// Shutdown grace period.
    pub grace: Option<String>,
    /// Server-side bound of each blocking query.
    pub wait_time: Option<String>,
}

impl Config {
    /// Built-in defaults (lowest layer).
    pub fn defaults() -> Self {
        Self {
            nomad_addr: Some(DEFAULT_NOMAD_ADDR.to_string()),
            nomad_token: None,
            sinks: Some(vec![SinkKind::Stdout.to_string()]),
            event_types: Some(Vec::new()),
            rate_limit: Some("5s".to_string()),
            file_path: Some(PathBuf::from(DEFAULT_FILE_PATH)),
            grace: Some("60s".to_string()),
            wait_time: Some("30s".to_string()),
        }
    }

    /// Reads a TOML layer from `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlays `over` on `self`; fields set in `over` win.
    #[must_use]
    pub fn merge(self, over: Config) -> Config {
        Config {
            nomad_addr: over.nomad_addr.or(self.nomad_addr),
            nomad_token: over.nomad_token.or(self.nomad_token),
            sinks: over.sinks.or(self.sinks),
            event_types: over.event_types.or(self.event_types),
            rate_limit: over.rate_limit.or(self.rate_limit),
            file_path: over.file_path.or(self.file_path),
            grace: over.grace.or(self.grace),
            wait_time: over.wait_time.or(self.wait_time),
        }
    }

    /// Checks the configuration and resolves it into [`Settings`].
    pub fn validate(self) -> Result<Settings, ConfigError> {
        let address = self
            .nomad_addr
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .ok_or(ConfigError::MissingAddress)?;

        let names = self.sinks.unwrap_or_default();
        if names.is_empty() {
            return Err(ConfigError::NoSinks);
        }
        let mut sinks = Vec::with_capacity(names.len());
        for name in &names {
            let kind: SinkKind = name.parse()?;
            if !sinks.contains(&kind) {
                sinks.push(kind);
            }
        }

        let file_path = self.file_path.filter(|p| !p.as_os_str().is_empty());
        if sinks.contains(&SinkKind::File) && file_path.is_none() {
            return Err(ConfigError::MissingFilePath);
        }

        let mut event_types = self
            .event_types
            .unwrap_or_default()
            .iter()
            .map(|s| s.parse::<EventType>())
            .collect::<Result<BTreeSet<_>, _>>()?;
        if event_types.is_empty() {
            event_types.extend(EventType::ALL);
        }

        Ok(Settings {
            address,
            token: self.nomad_token.filter(|t| !t.is_empty()),
            sinks,
            event_types,
            rate_limit: parse_opt(self.rate_limit, DEFAULT_RATE_LIMIT)?,
            file_path,
            grace: parse_opt(self.grace, DEFAULT_GRACE)?,
            wait_time: parse_wait_time(self.wait_time)?,
        })
    }
}

/// Validated configuration consumed by [`AgentBuilder`](crate::AgentBuilder).
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub address: String,
    pub token: Option<String>,
    /// Distinct sinks, in configuration order.
    pub sinks: Vec<SinkKind>,
    /// Never empty.
    pub event_types: BTreeSet<EventType>,
    pub rate_limit: Duration,
    /// Set whenever `sinks` contains [`SinkKind::File`].
    pub file_path: Option<PathBuf>,
    pub grace: Duration,
    pub wait_time: Duration,
}

impl Default for Settings {
    /// Same as validating [`Config::defaults`].
    fn default() -> Self {
        Self {
            address: DEFAULT_NOMAD_ADDR.to_string(),
            token: None,
            sinks: vec![SinkKind::Stdout],
            event_types: EventType::ALL.into_iter().collect(),
            rate_limit: DEFAULT_RATE_LIMIT,
            file_path: Some(PathBuf::from(DEFAULT_FILE_PATH)),
            grace: DEFAULT_GRACE,
            wait_time: DEFAULT_WAIT_TIME,
        }
    }
}

fn parse_opt(raw: Option<String>, default: Duration) -> Result<Duration, ConfigError> {
    raw.as_deref().map_or(Ok(default), parse_duration)
}

fn parse_wait_time(raw: Option<String>) -> Result<Duration, ConfigError> {
    let wait = parse_opt(raw.clone(), DEFAULT_WAIT_TIME)?;
    if wait > MAX_WAIT_TIME {
        return Err(ConfigError::InvalidDuration {
            input: raw.unwrap_or_default(),
            reason: "wait time exceeds the 10m maximum",
        });
    }
    Ok(wait)
}

/// Parses `"500ms"`, `"5s"`, `"1m"`, `"1h"` or bare seconds.
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason| ConfigError::InvalidDuration {
        input: input.to_string(),
        reason,
    };

    let s = input.trim();
    if s.is_empty() {
        return Err(invalid("empty"));
    }

    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    if digits.is_empty() {
        return Err(invalid("expected a number"));
    }
    let n: u64 = digits.parse().map_err(|_| invalid("number out of range"))?;

    let secs = |mult: u64| {
        n.checked_mul(mult)
            .map(Duration::from_secs)
            .ok_or_else(|| invalid("number out of range"))
    };
    match unit {
        "ms" => Ok(Duration::from_millis(n)),
        "" | "s" => Ok(Duration::from_secs(n)),
        "m" => secs(60),
        "h" => secs(3600),
        _ => Err(invalid("unknown unit (use ms, s, m or h)")),
    }
}
