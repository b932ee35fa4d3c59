//! # Task composite payload.
//!
//! Flattens allocation identity, a task name, the task's state snapshot and one
//! raw task event into a single object. Built fresh for every emitted task event.

use serde::Serialize;
use serde_json::Value;

use crate::client::{AllocationStub, TaskEvent, TaskState};

/// Payload of a `task` envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskComposite {
    #[serde(rename = "AllocationName")]
    pub allocation_name: String,
    #[serde(rename = "AllocationID")]
    pub allocation_id: String,
    #[serde(rename = "NodeID")]
    pub node_id: String,
    #[serde(rename = "EvalID")]
    pub eval_id: String,
    #[serde(rename = "DesiredStatus")]
    pub desired_status: String,
    #[serde(rename = "DesiredDescription")]
    pub desired_description: String,
    #[serde(rename = "ClientStatus")]
    pub client_status: String,
    #[serde(rename = "ClientDescription")]
    pub client_description: String,
    #[serde(rename = "JobID")]
    pub job_id: String,
    #[serde(rename = "TaskGroup")]
    pub task_group: String,

    #[serde(rename = "TaskName")]
    pub task_name: String,
    #[serde(rename = "TaskEvent")]
    pub task_event: TaskEvent,
    #[serde(rename = "TaskInfo")]
    pub task_info: TaskInfo,
}

/// Snapshot of the task state at the time the event was observed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskInfo {
    pub state: String,
    pub failed: bool,
    pub restarts: u64,
    pub last_restart: Value,
    pub started_at: Value,
    pub finished_at: Value,
}

impl From<&TaskState> for TaskInfo {
    fn from(s: &TaskState) -> Self {
        Self {
            state: s.state.clone(),
            failed: s.failed,
            restarts: s.restarts,
            last_restart: s.last_restart.clone(),
            started_at: s.started_at.clone(),
            finished_at: s.finished_at.clone(),
        }
    }
}

impl TaskComposite {
    pub fn new(
        alloc: &AllocationStub,
        task_name: &str,
        state: &TaskState,
        event: &TaskEvent,
    ) -> Self {
        Self {
            allocation_name: alloc.name.clone(),
            allocation_id: alloc.id.clone(),
            node_id: alloc.node_id.clone(),
            eval_id: alloc.eval_id.clone(),
            desired_status: alloc.desired_status.clone(),
            desired_description: alloc.desired_description.clone(),
            client_status: alloc.client_status.clone(),
            client_description: alloc.client_description.clone(),
            job_id: alloc.job_id.clone(),
            task_group: alloc.task_group.clone(),
            task_name: task_name.to_string(),
            task_event: event.clone(),
            task_info: TaskInfo::from(state),
        }
    }
}
