//! # Cluster API client abstraction.
//!
//! Managers never talk HTTP directly; they issue blocking list queries through
//! [`ClusterClient`]. A query carries a wait index and a wait bound: the call
//! returns early once the orchestrator's index moves past the wait index, or at
//! the bound with whatever the current listing is.
//!
//! ```text
//! ResourceManager ──► ClusterClient::list(kind, QueryOptions{wait_index, wait_time})
//!                          │
//!                          └──► Listing { records: Vec<Value>, last_index }
//! ```
//!
//! [`HttpClient`] implements the trait against the Nomad `/v1/*` endpoints.

mod http;
mod records;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ClientError;

pub use http::HttpClient;
pub use records::{
    AllocationStub, Deployment, Evaluation, JobStub, NodeStub, Record, TaskEvent, TaskState,
};

/// Upper bound a blocking query may wait server-side.
pub const DEFAULT_WAIT_TIME: Duration = Duration::from_secs(30);

/// Resource collections that can be listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Allocations,
    Evaluations,
    Nodes,
    Jobs,
    Deployments,
}

impl ResourceKind {
    /// Path segment under `/v1/`.
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::Allocations => "allocations",
            ResourceKind::Evaluations => "evaluations",
            ResourceKind::Nodes => "nodes",
            ResourceKind::Jobs => "jobs",
            ResourceKind::Deployments => "deployments",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Parameters of one blocking list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Return once the cluster index exceeds this value (0 = return immediately).
    pub wait_index: u64,
    /// Maximum server-side wait.
    pub wait_time: Duration,
    /// Allow any server (not only the leader) to answer.
    pub allow_stale: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            wait_index: 0,
            wait_time: DEFAULT_WAIT_TIME,
            allow_stale: false,
        }
    }
}

/// Result of a list query: raw records in API order plus the reported index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    pub records: Vec<Value>,
    pub last_index: u64,
}

/// Blocking list queries against the cluster API.
///
/// Implementations must be safe to share between managers.
#[async_trait]
pub trait ClusterClient: Send + Sync + 'static {
    /// Lists `kind`, blocking according to `query`.
    async fn list(&self, kind: ResourceKind, query: &QueryOptions) -> Result<Listing, ClientError>;
}
