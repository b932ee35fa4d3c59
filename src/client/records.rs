//! Typed views over the raw records returned by list queries.
//!
//! Only the fields the dedup filters need are named; everything else is kept in
//! `extra` so that re-serializing a record yields the payload the API sent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record carrying the orchestrator's per-change cursor.
pub trait Record {
    /// Record identifier (`ID`), used for log context.
    fn id(&self) -> &str;
    /// Index assigned by the orchestrator on the record's last change.
    fn modify_index(&self) -> u64;
}

/// `GET /v1/jobs` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStub {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "ModifyIndex", default)]
    pub modify_index: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /v1/nodes` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStub {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "ModifyIndex", default)]
    pub modify_index: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /v1/deployments` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "ModifyIndex", default)]
    pub modify_index: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /v1/evaluations` entry.
///
/// `SnapshotIndex == 0` means the evaluation is not yet persisted to raft state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "ModifyIndex", default)]
    pub modify_index: u64,
    #[serde(rename = "SnapshotIndex", default)]
    pub snapshot_index: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for JobStub {
    fn id(&self) -> &str {
        &self.id
    }
    fn modify_index(&self) -> u64 {
        self.modify_index
    }
}

impl Record for NodeStub {
    fn id(&self) -> &str {
        &self.id
    }
    fn modify_index(&self) -> u64 {
        self.modify_index
    }
}

impl Record for Deployment {
    fn id(&self) -> &str {
        &self.id
    }
    fn modify_index(&self) -> u64 {
        self.modify_index
    }
}

impl Record for Evaluation {
    fn id(&self) -> &str {
        &self.id
    }
    fn modify_index(&self) -> u64 {
        self.modify_index
    }
}

/// `GET /v1/allocations` entry, reduced to what task-event extraction reads.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AllocationStub {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "NodeID", default)]
    pub node_id: String,
    #[serde(rename = "EvalID", default)]
    pub eval_id: String,
    #[serde(rename = "DesiredStatus", default)]
    pub desired_status: String,
    #[serde(rename = "DesiredDescription", default)]
    pub desired_description: String,
    #[serde(rename = "ClientStatus", default)]
    pub client_status: String,
    #[serde(rename = "ClientDescription", default)]
    pub client_description: String,
    #[serde(rename = "JobID", default)]
    pub job_id: String,
    #[serde(rename = "TaskGroup", default)]
    pub task_group: String,
    /// Keyed by task name; sorted so tasks are visited deterministically.
    #[serde(rename = "TaskStates", default)]
    pub task_states: Option<BTreeMap<String, TaskState>>,
}

/// Per-task state snapshot inside an allocation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TaskState {
    #[serde(rename = "State", default)]
    pub state: String,
    #[serde(rename = "Failed", default)]
    pub failed: bool,
    #[serde(rename = "Restarts", default)]
    pub restarts: u64,
    #[serde(rename = "LastRestart", default)]
    pub last_restart: Value,
    #[serde(rename = "StartedAt", default)]
    pub started_at: Value,
    #[serde(rename = "FinishedAt", default)]
    pub finished_at: Value,
    #[serde(rename = "Events", default)]
    pub events: Option<Vec<TaskEvent>>,
}

/// One raw task event. `Time` is Unix nanoseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskEvent {
    #[serde(rename = "Type", default)]
    pub kind: String,
    #[serde(rename = "Time", default)]
    pub time: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
