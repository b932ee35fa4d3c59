//! # nomad-event-logger
//!
//! **nomad-event-logger** watches a Nomad cluster for resource changes and
//! forwards every new change, as a typed JSON envelope, to pluggable sinks.
//!
//! Each watched collection (allocations, evaluations, nodes, jobs,
//! deployments) gets its own long-polling manager. Managers deduplicate with
//! per-manager watermarks so that only records changed since the previous
//! cycle are emitted, and they never emit anything on their first cycle.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                   ┌───────────────────────────────┐
//!                   │ Agent (start / stop / grace)  │
//!                   └──────┬─────────────┬──────────┘
//!                          ▼             ▼
//!              ┌──────────────────┐  ┌──────────────────┐
//!              │ ResourceManager  │  │ ResourceManager  │  ... one per collection
//!              │  Watcher loop    │  │  Watcher loop    │
//!              │  WatchState      │  │  WatchState      │
//!              └───┬──────────┬───┘  └───┬──────────┬───┘
//!                  │          │          │          │
//!   list(kind, wait_index)    │          │          │
//!                  ▼          │          ▼          │
//!          ┌────────────────┐ │  ┌────────────────┐ │
//!          │ ClusterClient  │ │  │ ClusterClient  │ │   (shared HttpClient)
//!          └────────────────┘ │  └────────────────┘ │
//!                             ▼                     ▼
//!                       SinkFanout            SinkFanout
//!                             └─────────┬───────────┘
//!                                 ┌─────┴─────┐
//!                                 ▼           ▼
//!                            StreamSink    FileSink      (shared, read-only set)
//! ```
//!
//! ### One poll cycle
//! ```text
//! rate-limit wait (cancellable)
//!   └─► list(kind, wait_index = last_index, wait = 30s)
//!         ├─ Err ──► log, backoff 5s (cancellable), retry
//!         └─ Ok(listing)
//!               ├─ filter against watermarks (index `>` / task event time `>=`)
//!               ├─ first run? advance watermarks only
//!               ├─ otherwise emit Envelope per new record ──► SinkFanout
//!               └─ first_run = false
//! ```
//!
//! ## Features
//! | Area              | Description                                               | Key types / traits                         |
//! |-------------------|-----------------------------------------------------------|--------------------------------------------|
//! | **Agent**         | Build, start and stop all managers.                       | [`Agent`], [`AgentBuilder`]                |
//! | **Managers**      | Per-collection filter and emission policy.                | [`ResourceManager`], [`Resource`]          |
//! | **Polling**       | Rate-limited retry loop and watermarks.                   | [`Watcher`], [`WatchState`], [`Poll`]      |
//! | **Cluster API**   | Blocking list queries.                                    | [`ClusterClient`], [`HttpClient`]          |
//! | **Sinks**         | Output destinations and fan-out.                          | [`Sink`], [`StreamSink`], [`FileSink`]     |
//! | **Events**        | Envelope and payload types.                               | [`Envelope`], [`EventType`], [`TaskComposite`] |
//! | **Configuration** | Layered config and validated settings.                    | [`Config`], [`Settings`]                   |
//! | **Errors**        | Typed errors with stable log labels.                      | [`RuntimeError`], [`ConfigError`], ...     |
//!
//! ## Example
//! ```no_run
//! use nomad_event_logger::{Agent, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let over = Config {
//!         nomad_addr: Some("http://127.0.0.1:4646".into()),
//!         event_types: Some(vec!["job".into(), "task".into()]),
//!         ..Config::default()
//!     };
//!     let settings = Config::defaults().merge(over).validate()?;
//!
//!     let mut agent = Agent::builder(settings).build()?;
//!     agent.start();
//!     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!     agent.stop().await?;
//!     Ok(())
//! }
//! ```
mod client;
mod config;
mod core;
mod error;
mod events;
mod managers;
mod sinks;
mod watch;

// ---- Public re-exports ----

pub use client::{
    AllocationStub, ClusterClient, DEFAULT_WAIT_TIME, Deployment, Evaluation, HttpClient, JobStub,
    Listing, NodeStub, QueryOptions, Record, ResourceKind, TaskEvent, TaskState,
};
pub use config::{Config, Settings, parse_duration};
pub use core::{Agent, AgentBuilder};
pub use error::{ClientError, ConfigError, ManagerError, RuntimeError, SinkError};
pub use events::{Envelope, EventType, TaskComposite, TaskInfo};
pub use managers::{
    Allocations, Deployments, Evaluations, Jobs, ManagerSettings, Nodes, Resource, ResourceManager,
};
pub use sinks::{Delivery, FileSink, Sink, SinkFanout, SinkKind, SinkRef, StreamSink};
pub use watch::{DEFAULT_ERROR_BACKOFF, Poll, WatchState, Watcher};
