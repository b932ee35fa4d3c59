//! # Allocation manager: task events.
//!
//! Every task event of every allocation in the listing is scanned. An event is
//! new when its time is not earlier than `last_seen_time`. The highest event
//! time in the whole listing becomes the new watermark, committed once the
//! scan is over, so events from different allocations with equal times are all
//! emitted in the same cycle.
//!
//! One `task` envelope (a [`TaskComposite`]) is emitted per new task event.

use tracing::debug;

use crate::client::{AllocationStub, Listing, ResourceKind};
use crate::events::{Envelope, EventType, TaskComposite};
use crate::watch::WatchState;

use super::{Resource, decode_records, envelope_for};

/// Allocations, watched for task state transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Allocations;

impl Resource for Allocations {
    fn event_type(&self) -> EventType {
        EventType::Allocation
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Allocations
    }

    fn allow_stale(&self) -> bool {
        true
    }

    fn collect(&self, state: &mut WatchState, listing: Listing) -> Vec<Envelope> {
        state.advance_index(listing.last_index);

        let allocs: Vec<AllocationStub> = decode_records(self.kind(), listing.records);
        let mut out = Vec::new();
        let mut max_time = state.last_seen_time();

        for alloc in &allocs {
            let Some(task_states) = &alloc.task_states else {
                continue;
            };
            for (task_name, task_state) in task_states {
                let Some(events) = &task_state.events else {
                    continue;
                };
                for event in events {
                    if !state.is_new_event_time(event.time) {
                        continue;
                    }
                    max_time = max_time.max(event.time);
                    if state.is_first_run() {
                        continue;
                    }

                    let composite = TaskComposite::new(alloc, task_name, task_state, event);
                    if let Some(envelope) = envelope_for(EventType::Task, &alloc.id, &composite) {
                        debug!(
                            allocation_id = %alloc.id,
                            job_id = %alloc.job_id,
                            task_name = %task_name,
                            task_event = %event.kind,
                            "task event"
                        );
                        out.push(envelope);
                    }
                }
            }
        }

        state.advance_seen_time(max_time);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managers::run_cycle;
    use serde_json::{Value, json};

    fn alloc(id: &str, tasks: Value) -> Value {
        json!({
            "ID": id,
            "Name": format!("web.app[{id}]"),
            "NodeID": "node-1",
            "EvalID": "eval-1",
            "DesiredStatus": "run",
            "ClientStatus": "running",
            "JobID": "web",
            "TaskGroup": "app",
            "ModifyIndex": 10,
            "TaskStates": tasks
        })
    }

    fn task(events: &[(&str, i64)]) -> Value {
        let events: Vec<Value> = events
            .iter()
            .map(|(kind, time)| json!({"Type": kind, "Time": time, "Message": ""}))
            .collect();
        json!({"State": "running", "Failed": false, "Restarts": 0, "Events": events})
    }

    fn listing(allocs: Vec<Value>, last_index: u64) -> Listing {
        Listing {
            records: allocs,
            last_index,
        }
    }

    #[test]
    fn test_first_run_only_advances_watermarks() {
        let mut state = WatchState::default();
        let out = run_cycle(
            &Allocations,
            &mut state,
            listing(
                vec![
                    alloc("a1", json!({"server": task(&[("Received", 100), ("Started", 200)])})),
                    alloc("a2", json!({"server": task(&[("Received", 150)])})),
                ],
                33,
            ),
        );

        assert!(out.is_empty());
        assert_eq!(state.last_seen_time(), 200);
        assert_eq!(state.last_index(), 33);
        assert!(!state.is_first_run());
    }

    #[test]
    fn test_emits_task_composites_for_new_events() {
        let mut state = WatchState::default();
        run_cycle(
            &Allocations,
            &mut state,
            listing(vec![alloc("a1", json!({"server": task(&[("Started", 200)])}))], 1),
        );

        let out = run_cycle(
            &Allocations,
            &mut state,
            listing(
                vec![
                    alloc(
                        "a1",
                        json!({"server": task(&[("Started", 200), ("Terminated", 300)])}),
                    ),
                    alloc("a2", json!({"sidecar": task(&[("Received", 100), ("Started", 250)])})),
                ],
                2,
            ),
        );

        let seen: Vec<(String, String, i64)> = out
            .iter()
            .map(|e| {
                let d = e.data();
                (
                    d["AllocationID"].as_str().unwrap().to_string(),
                    d["TaskEvent"]["Type"].as_str().unwrap().to_string(),
                    d["TaskEvent"]["Time"].as_i64().unwrap(),
                )
            })
            .collect();

        // Event at 200 sits exactly on the watermark and is emitted again.
        assert_eq!(
            seen,
            vec![
                ("a1".to_string(), "Started".to_string(), 200),
                ("a1".to_string(), "Terminated".to_string(), 300),
                ("a2".to_string(), "Started".to_string(), 250),
            ]
        );
        assert!(out.iter().all(|e| e.kind() == EventType::Task));
        assert_eq!(out[2].data()["TaskName"], "sidecar");
        assert_eq!(out[2].data()["JobID"], "web");
        assert_eq!(out[2].data()["TaskInfo"]["State"], "running");
        assert_eq!(state.last_seen_time(), 300);
    }

    #[test]
    fn test_boundary_event_reemitted_until_watermark_moves() {
        let mut state = WatchState::default();
        let snapshot = || listing(vec![alloc("a1", json!({"server": task(&[("Started", 500)])}))], 1);

        run_cycle(&Allocations, &mut state, snapshot());
        assert_eq!(run_cycle(&Allocations, &mut state, snapshot()).len(), 1);
        assert_eq!(run_cycle(&Allocations, &mut state, snapshot()).len(), 1);

        let moved = listing(
            vec![alloc("a1", json!({"server": task(&[("Started", 500), ("Killed", 600)])}))],
            2,
        );
        let out = run_cycle(&Allocations, &mut state, moved.clone());
        assert_eq!(out.len(), 2);
        let out = run_cycle(&Allocations, &mut state, moved);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].data()["TaskEvent"]["Type"], "Killed");
    }

    #[test]
    fn test_allocations_without_task_states_are_skipped() {
        let mut state = WatchState::default();
        run_cycle(&Allocations, &mut state, listing(vec![], 1));

        let out = run_cycle(
            &Allocations,
            &mut state,
            listing(
                vec![
                    alloc("a1", Value::Null),
                    alloc("a2", json!({"server": {"State": "pending", "Events": null}})),
                    json!({"ID": "broken", "TaskStates": "not a map"}),
                    alloc("a3", json!({"server": task(&[("Received", 10)])})),
                ],
                2,
            ),
        );

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].data()["AllocationID"], "a3");
    }

    #[test]
    fn test_older_events_never_emitted() {
        let mut state = WatchState::default();
        run_cycle(
            &Allocations,
            &mut state,
            listing(vec![alloc("a1", json!({"server": task(&[("Started", 1_000)])}))], 1),
        );

        let out = run_cycle(
            &Allocations,
            &mut state,
            listing(vec![alloc("a2", json!({"server": task(&[("Received", 999)])}))], 2),
        );

        assert!(out.is_empty());
        assert_eq!(state.last_seen_time(), 1_000);
    }
}
