//! # Resource managers.
//!
//! One [`ResourceManager`] runs per watched resource collection. Every manager
//! is the same loop (a [`Watcher`](crate::Watcher) driving blocking list queries);
//! what differs is the [`Resource`] strategy plugged into it:
//!
//! | resource      | query           | stale reads | filter                          | envelope     |
//! |---------------|-----------------|-------------|---------------------------------|--------------|
//! | [`Allocations`] | `allocations` | yes         | task event time `>=` watermark  | `task`       |
//! | [`Evaluations`] | `evaluations` | yes         | modify index, `SnapshotIndex != 0` | `evaluation` |
//! | [`Nodes`]       | `nodes`       | no          | modify index                    | `node`       |
//! | [`Jobs`]        | `jobs`        | no          | modify index                    | `job`        |
//! | [`Deployments`] | `deployments` | no          | modify index                    | `deployment` |
//!
//! ## Cycle
//! ```text
//! list(kind, wait_index = last_index) ──► Listing
//!        │
//!        └──► Resource::collect(state, listing)   (filters, advances watermarks)
//!                  │
//!                  └──► Vec<Envelope> ──► SinkFanout::write_event (scan order)
//!        │
//!        └──► WatchState::complete_cycle()        (first run ends here)
//! ```
//!
//! During the first cycle `collect` still advances the watermarks but returns
//! no envelopes.

mod allocation;
mod deployment;
mod evaluation;
mod job;
mod manager;
mod node;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::client::{Listing, Record, ResourceKind};
use crate::events::{Envelope, EventType};
use crate::watch::WatchState;

pub use allocation::Allocations;
pub use deployment::Deployments;
pub use evaluation::Evaluations;
pub use job::Jobs;
pub use manager::{ManagerSettings, ResourceManager};
pub use node::Nodes;

/// Filter and emission policy of one resource collection.
pub trait Resource: Send + Sync + 'static {
    /// Identity of the manager (log field, shutdown reports).
    fn event_type(&self) -> EventType;

    /// Collection queried on every poll.
    fn kind(&self) -> ResourceKind;

    /// Whether any server may answer the query.
    fn allow_stale(&self) -> bool {
        false
    }

    /// Filters `listing` against `state`, advances the watermarks and returns the
    /// envelopes to emit in scan order. Must return nothing while `state` is in
    /// its first run.
    fn collect(&self, state: &mut WatchState, listing: Listing) -> Vec<Envelope>;
}

/// Runs `collect` and closes the cycle.
pub(crate) fn run_cycle(
    resource: &dyn Resource,
    state: &mut WatchState,
    listing: Listing,
) -> Vec<Envelope> {
    let envelopes = resource.collect(state, listing);
    if state.complete_cycle() {
        info!(
            last_index = state.last_index(),
            "first run completed, events will be processed on subsequent runs"
        );
    }
    envelopes
}

/// Decodes raw records, skipping (and logging) the ones that do not fit `T`.
pub(crate) fn decode_records<T: DeserializeOwned>(kind: ResourceKind, records: Vec<Value>) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|raw| {
            let id = raw
                .get("ID")
                .and_then(Value::as_str)
                .unwrap_or("<unknown>")
                .to_string();
            match serde_json::from_value(raw) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(%kind, record_id = %id, error = %e, "skipping undecodable record");
                    None
                }
            }
        })
        .collect()
}

/// Wraps `record` in an envelope, logging (and dropping) serialization failures.
pub(crate) fn envelope_for<T: Serialize>(event_type: EventType, id: &str, record: &T) -> Option<Envelope> {
    match Envelope::from_record(event_type, record) {
        Ok(envelope) => Some(envelope),
        Err(e) => {
            warn!(%event_type, record_id = %id, error = %e, "failed to build event");
            None
        }
    }
}

/// Index filter shared by the evaluation, node, job and deployment managers.
///
/// A record is emitted when its modify index is strictly above the watermark
/// at filter time and `keep` accepts it. The watermark is then moved to the
/// highest modify index seen in `records`.
pub(crate) fn collect_indexed<R, F>(
    state: &mut WatchState,
    event_type: EventType,
    records: &[R],
    mut keep: F,
) -> Vec<Envelope>
where
    R: Record + Serialize,
    F: FnMut(&R) -> bool,
{
    let mut out = Vec::new();
    let mut max_index = state.last_index();

    for record in records {
        let index = record.modify_index();
        max_index = max_index.max(index);

        if state.is_first_run() || !state.is_new_index(index) || !keep(record) {
            continue;
        }
        if let Some(envelope) = envelope_for(event_type, record.id(), record) {
            out.push(envelope);
        }
    }

    state.advance_index(max_index);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::JobStub;
    use serde_json::json;

    #[test]
    fn test_decode_skips_bad_records() {
        let records = vec![
            json!({"ID": "a", "ModifyIndex": 1}),
            json!({"ID": "b", "ModifyIndex": "not a number"}),
            json!({"ID": "c", "ModifyIndex": 3}),
        ];

        let jobs: Vec<JobStub> = decode_records(ResourceKind::Jobs, records);

        let ids: Vec<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn test_collect_indexed_honours_keep() {
        let jobs: Vec<JobStub> = decode_records(
            ResourceKind::Jobs,
            vec![
                json!({"ID": "a", "ModifyIndex": 4}),
                json!({"ID": "b", "ModifyIndex": 5}),
            ],
        );
        let mut state = WatchState::default();
        state.advance_index(2);
        state.complete_cycle();

        let out = collect_indexed(&mut state, EventType::Job, &jobs, |j| j.id != "a");

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].data()["ID"], "b");
        // Rejected records still move the watermark.
        assert_eq!(state.last_index(), 5);
    }
}
