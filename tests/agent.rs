use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use nomad_event_logger::{
    Agent, ClientError, ClusterClient, Envelope, EventType, Listing, QueryOptions, ResourceKind,
    RuntimeError, Settings, Sink, SinkError, SinkRef,
};
use serde_json::{Value, json};

/// In-memory cluster: plays back scripted listings per collection, then
/// behaves like an idle long poll (waits `wait_time`, returns nothing new).
#[derive(Default)]
struct ScriptedCluster {
    scripts: Mutex<HashMap<ResourceKind, VecDeque<Result<Listing, u16>>>>,
    hang: bool,
}

impl ScriptedCluster {
    fn with(mut self, kind: ResourceKind, steps: Vec<Result<Listing, u16>>) -> Self {
        self.scripts.get_mut().unwrap().insert(kind, steps.into());
        self
    }

    fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ClusterClient for ScriptedCluster {
    async fn list(&self, kind: ResourceKind, query: &QueryOptions) -> Result<Listing, ClientError> {
        if self.hang {
            futures::future::pending::<()>().await;
        }
        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&kind)
            .and_then(VecDeque::pop_front);
        match step {
            Some(Ok(listing)) => Ok(listing),
            Some(Err(status)) => Err(ClientError::Status { kind, status }),
            None => {
                tokio::time::sleep(query.wait_time).await;
                Ok(Listing {
                    records: Vec::new(),
                    last_index: query.wait_index,
                })
            }
        }
    }
}

#[derive(Default)]
struct MemorySink {
    events: Mutex<Vec<Envelope>>,
    closed: AtomicBool,
}

impl MemorySink {
    fn events(&self) -> Vec<Envelope> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn write(&self, envelope: &Envelope) -> Result<(), SinkError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SinkError::Closed);
        }
        self.events.lock().unwrap().push(envelope.clone());
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

fn settings(types: &[EventType]) -> Settings {
    Settings {
        event_types: types.iter().copied().collect(),
        wait_time: Duration::from_secs(1),
        ..Settings::default()
    }
}

fn jobs(indexes: &[u64], last_index: u64) -> Listing {
    Listing {
        records: indexes
            .iter()
            .map(|i| json!({"ID": format!("job-{i}"), "ModifyIndex": i}))
            .collect(),
        last_index,
    }
}

fn allocation(events: &[i64]) -> Value {
    let events: Vec<Value> = events
        .iter()
        .map(|t| json!({"Type": "Started", "Time": t}))
        .collect();
    json!({
        "ID": "alloc-1",
        "Name": "web.app[0]",
        "JobID": "web",
        "TaskGroup": "app",
        "TaskStates": {"server": {"State": "running", "Events": events}}
    })
}

#[tokio::test(start_paused = true)]
async fn test_job_changes_reach_every_sink() {
    let cluster = ScriptedCluster::default().with(
        ResourceKind::Jobs,
        vec![Ok(jobs(&[5, 7], 7)), Ok(jobs(&[7, 9], 9))],
    );
    let a = Arc::new(MemorySink::default());
    let b = Arc::new(MemorySink::default());

    let mut agent = Agent::builder(settings(&[EventType::Job]))
        .with_client(Arc::new(cluster))
        .with_sinks(vec![a.clone() as SinkRef, b.clone() as SinkRef])
        .build()
        .unwrap();
    assert_eq!(agent.event_types(), vec![EventType::Job]);

    agent.start();
    tokio::time::sleep(Duration::from_secs(5)).await;
    agent.stop().await.unwrap();

    for sink in [&a, &b] {
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), EventType::Job);
        assert_eq!(events[0].data()["ModifyIndex"], 9);
        assert!(sink.closed.load(Ordering::SeqCst));
    }
}

#[tokio::test(start_paused = true)]
async fn test_query_errors_do_not_stop_manager() {
    let cluster = ScriptedCluster::default().with(
        ResourceKind::Nodes,
        vec![
            Ok(Listing { records: vec![], last_index: 3 }),
            Err(500),
            Err(503),
            Ok(Listing {
                records: vec![json!({"ID": "n1", "ModifyIndex": 4, "Status": "down"})],
                last_index: 4,
            }),
        ],
    );
    let sink = Arc::new(MemorySink::default());

    let mut agent = Agent::builder(settings(&[EventType::Node]))
        .with_client(Arc::new(cluster))
        .with_sinks(vec![sink.clone() as SinkRef])
        .build()
        .unwrap();

    agent.start();
    tokio::time::sleep(Duration::from_secs(30)).await;
    agent.stop().await.unwrap();

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data()["ID"], "n1");
}

#[tokio::test(start_paused = true)]
async fn test_allocation_and_task_share_one_manager() {
    let cluster = ScriptedCluster::default().with(
        ResourceKind::Allocations,
        vec![
            Ok(Listing { records: vec![allocation(&[100])], last_index: 1 }),
            Ok(Listing { records: vec![allocation(&[100, 200])], last_index: 2 }),
        ],
    );
    let sink = Arc::new(MemorySink::default());

    let mut agent = Agent::builder(settings(&[EventType::Allocation, EventType::Task]))
        .with_client(Arc::new(cluster))
        .with_sinks(vec![sink.clone() as SinkRef])
        .build()
        .unwrap();
    assert_eq!(agent.event_types(), vec![EventType::Allocation]);

    agent.start();
    tokio::time::sleep(Duration::from_secs(20)).await;
    agent.stop().await.unwrap();

    let events = sink.events();
    let times: Vec<i64> = events
        .iter()
        .map(|e| e.data()["TaskEvent"]["Time"].as_i64().unwrap())
        .collect();
    // One manager: each task event appears once per cycle, not twice.
    assert_eq!(times, vec![100, 200]);
    assert!(events.iter().all(|e| e.kind() == EventType::Task));
    assert_eq!(events[0].data()["TaskName"], "server");
}

#[tokio::test(start_paused = true)]
async fn test_grace_exceeded_aborts_and_still_closes_sinks() {
    let sink = Arc::new(MemorySink::default());
    let mut agent = Agent::builder(Settings {
        grace: Duration::from_millis(100),
        ..settings(&[EventType::Job])
    })
    .with_client(Arc::new(ScriptedCluster::hanging()))
    .with_sinks(vec![sink.clone() as SinkRef])
    .build()
    .unwrap();

    agent.start();
    tokio::time::sleep(Duration::from_secs(1)).await;
    let err = agent.stop().await.unwrap_err();

    match err {
        RuntimeError::GraceExceeded { grace, stuck } => {
            assert_eq!(grace, Duration::from_millis(100));
            assert_eq!(stuck, vec!["job".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(sink.closed.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_configured_backoff_spaces_retries() {
    let cluster = ScriptedCluster::default().with(
        ResourceKind::Nodes,
        vec![
            Ok(Listing { records: vec![], last_index: 3 }),
            Err(500),
            Err(500),
            Ok(Listing {
                records: vec![json!({"ID": "n1", "ModifyIndex": 4, "Status": "ready"})],
                last_index: 4,
            }),
        ],
    );
    let sink = Arc::new(MemorySink::default());

    let mut agent = Agent::builder(settings(&[EventType::Node]))
        .with_client(Arc::new(cluster))
        .with_sinks(vec![sink.clone() as SinkRef])
        .with_backoff(Duration::from_secs(1))
        .build()
        .unwrap();

    agent.start();
    // Two failures at 1s each; the default 5s delay would not recover in time.
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(sink.events().len(), 1);
    agent.stop().await.unwrap();
}
