//! # ResourceManager: lifecycle of one watch loop.
//!
//! ```text
//!  new() ──► Pending ──start(parent)──► Running ──stop()──► Stopped
//!                          │
//!                          └─ start() again ──► ManagerError::AlreadyStarted
//! ```
//!
//! `start` spawns the loop on a child of the caller's cancellation token and
//! instruments it with the manager's span. `stop` cancels the manager's own
//! token and waits for the loop to exit.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, info, info_span};

use super::{Resource, run_cycle};
use crate::client::{ClusterClient, DEFAULT_WAIT_TIME, QueryOptions};
use crate::error::{ClientError, ManagerError};
use crate::events::EventType;
use crate::sinks::{SinkFanout, SinkRef};
use crate::watch::{DEFAULT_ERROR_BACKOFF, Poll, WatchState, Watcher};

/// Per-manager loop parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManagerSettings {
    /// Minimum spacing between poll starts (`ZERO` = unlimited).
    pub rate_limit: Duration,
    /// Server-side bound of each blocking query.
    pub wait_time: Duration,
    /// Fixed delay after a failed poll.
    pub backoff: Duration,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            rate_limit: Duration::ZERO,
            wait_time: DEFAULT_WAIT_TIME,
            backoff: DEFAULT_ERROR_BACKOFF,
        }
    }
}

/// What the watcher drives: query, filter, fan out.
struct ManagerLoop {
    client: Arc<dyn ClusterClient>,
    resource: Box<dyn Resource>,
    fanout: SinkFanout,
    wait_time: Duration,
}

#[async_trait]
impl Poll for ManagerLoop {
    async fn poll(&mut self, state: &mut WatchState) -> Result<(), ClientError> {
        let query = QueryOptions {
            wait_index: state.last_index(),
            wait_time: self.wait_time,
            allow_stale: self.resource.allow_stale(),
        };
        let listing = self.client.list(self.resource.kind(), &query).await?;

        for envelope in run_cycle(self.resource.as_ref(), state, listing) {
            self.fanout.write_event(&envelope).await;
        }
        Ok(())
    }
}

/// A watch loop for one resource collection, plus its lifecycle handles.
pub struct ResourceManager {
    event_type: EventType,
    span: Span,
    watcher: Watcher,
    pending: Option<(ManagerLoop, WatchState)>,
    token: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
}

impl ResourceManager {
    /// Creates a manager; nothing runs until [`start`](Self::start).
    ///
    /// The manager's span is a child of `parent_span` and carries `event_type`.
    pub fn new(
        resource: Box<dyn Resource>,
        client: Arc<dyn ClusterClient>,
        sinks: Arc<[SinkRef]>,
        settings: ManagerSettings,
        parent_span: &Span,
    ) -> Self {
        let event_type = resource.event_type();
        let span = info_span!(parent: parent_span, "manager", event_type = %event_type);

        let lp = ManagerLoop {
            client,
            resource,
            fanout: SinkFanout::new(sinks),
            wait_time: settings.wait_time,
        };

        Self {
            event_type,
            span,
            watcher: Watcher::new(settings.backoff),
            pending: Some((lp, WatchState::new(settings.rate_limit))),
            token: None,
            handle: None,
        }
    }

    #[inline]
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Spawns the loop under a child of `parent`.
    pub fn start(&mut self, parent: &CancellationToken) -> Result<(), ManagerError> {
        let (mut lp, mut state) = self.pending.take().ok_or(ManagerError::AlreadyStarted {
            event_type: self.event_type,
        })?;

        let token = parent.child_token();
        let watcher = self.watcher;
        let loop_token = token.clone();

        let handle = tokio::spawn(
            async move {
                info!(
                    rate_limit_ms = state.rate_limit().as_millis() as u64,
                    "starting manager"
                );
                watcher.run(&mut lp, &mut state, &loop_token).await;
                info!("manager stopped");
            }
            .instrument(self.span.clone()),
        );

        self.token = Some(token);
        self.handle = Some(handle);
        Ok(())
    }

    /// Cancels the loop and waits for it to exit.
    ///
    /// Returns immediately if the manager was never started or already stopped.
    pub async fn stop(&mut self) -> Result<(), ManagerError> {
        if let Some(token) = &self.token {
            token.cancel();
        }
        let Some(handle) = self.handle.as_mut() else {
            return Ok(());
        };

        let res = handle.await;
        self.handle = None;
        res.map_err(|e| ManagerError::Join {
            event_type: self.event_type,
            reason: e.to_string(),
        })
    }

    /// True while the spawned loop has not finished.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Forcibly ends the loop (used when a shutdown grace period expires).
    pub fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Listing, ResourceKind};
    use crate::managers::Jobs;
    use serde_json::json;
    use std::sync::Mutex;

    /// Returns the scripted listings in order, then blocks for `wait_time`.
    struct Scripted {
        script: Mutex<Vec<Listing>>,
        queries: Mutex<Vec<QueryOptions>>,
    }

    #[async_trait]
    impl ClusterClient for Scripted {
        async fn list(&self, _: ResourceKind, query: &QueryOptions) -> Result<Listing, ClientError> {
            self.queries.lock().unwrap().push(*query);
            let next = {
                let mut script = self.script.lock().unwrap();
                (!script.is_empty()).then(|| script.remove(0))
            };
            match next {
                Some(listing) => Ok(listing),
                None => {
                    tokio::time::sleep(query.wait_time).await;
                    Ok(Listing::default())
                }
            }
        }
    }

    fn manager(client: Arc<Scripted>) -> ResourceManager {
        ResourceManager::new(
            Box::new(Jobs),
            client,
            Arc::from(Vec::<SinkRef>::new()),
            ManagerSettings::default(),
            &Span::none(),
        )
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let client = Arc::new(Scripted {
            script: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        });
        let root = CancellationToken::new();
        let mut m = manager(client);

        m.start(&root).unwrap();
        let err = m.start(&root).unwrap_err();
        assert_eq!(err.as_label(), "manager_already_started");

        root.cancel();
        m.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_index_follows_watermark() {
        let client = Arc::new(Scripted {
            script: Mutex::new(vec![
                Listing {
                    records: vec![json!({"ID": "web", "ModifyIndex": 7})],
                    last_index: 7,
                },
                Listing {
                    records: vec![json!({"ID": "web", "ModifyIndex": 9})],
                    last_index: 9,
                },
            ]),
            queries: Mutex::new(Vec::new()),
        });
        let root = CancellationToken::new();
        let mut m = manager(client.clone());
        assert_eq!(m.event_type(), EventType::Job);

        m.start(&root).unwrap();
        assert!(m.is_running());
        tokio::time::sleep(Duration::from_secs(1)).await;
        m.stop().await.unwrap();
        assert!(!m.is_running());

        let waits: Vec<u64> = client
            .queries
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.wait_index)
            .collect();
        assert_eq!(&waits[..3], &[0, 7, 9]);
    }

    #[tokio::test]
    async fn test_stop_before_start_is_noop() {
        let client = Arc::new(Scripted {
            script: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        });
        let mut m = manager(client);
        m.stop().await.unwrap();
        assert!(!m.is_running());
    }
}
