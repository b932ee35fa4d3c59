//! # Agent: starts the resource managers, stops them, closes the sinks.
//!
//! The [`Agent`] owns every [`ResourceManager`], the shared sink set and the
//! root cancellation token. Each manager runs on its own tokio task under a
//! child of that token.
//!
//! ## High-level architecture
//! ```text
//! AgentBuilder::build()
//!     ├─ ClusterClient (HttpClient or injected)
//!     ├─ sinks: Arc<[SinkRef]> (shared, read-only)
//!     └─ ResourceManager × N (one per resource collection)
//!
//! Agent::start()
//!     └─ manager.start(&root_token)   → child token, tokio::spawn(watch loop)
//!
//! Agent::stop()
//!     ├─ root_token.cancel()          → propagates to child tokens
//!     ├─ wait for all loops, bounded by `grace`:
//!     │     ├─ Ok (all joined)        → info "all managers stopped"
//!     │     └─ Timeout exceeded       → abort stuck loops, GraceExceeded
//!     └─ sink.close() for every sink (always, errors logged)
//! ```
//!
//! A loop blocked in a long poll only notices cancellation once the poll
//! returns, so `grace` should exceed the poll wait bound.
//!
//! ## Example
//! ```no_run
//! use nomad_event_logger::{Agent, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Config::defaults().validate()?;
//!     let agent = Agent::builder(settings).build()?;
//!     agent.run_until_signal().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, error, info, warn};

use super::{builder::AgentBuilder, shutdown};
use crate::{
    config::Settings,
    error::RuntimeError,
    events::EventType,
    managers::ResourceManager,
    sinks::SinkRef,
};

/// Runs the configured resource managers and owns the sink set.
pub struct Agent {
    grace: Duration,
    managers: Vec<ResourceManager>,
    sinks: Arc<[SinkRef]>,
    token: CancellationToken,
    span: Span,
}

impl Agent {
    /// Returns a builder for the given settings.
    pub fn builder(settings: Settings) -> AgentBuilder {
        AgentBuilder::new(settings)
    }

    pub(crate) fn new_internal(
        grace: Duration,
        managers: Vec<ResourceManager>,
        sinks: Arc<[SinkRef]>,
        span: Span,
    ) -> Self {
        Self {
            grace,
            managers,
            sinks,
            token: CancellationToken::new(),
            span,
        }
    }

    /// Event types of the managers this agent runs.
    pub fn event_types(&self) -> Vec<EventType> {
        self.managers.iter().map(ResourceManager::event_type).collect()
    }

    /// Starts every manager. A manager that fails to start is logged; the rest proceed.
    pub fn start(&mut self) {
        let _enter = self.span.enter();
        for manager in &mut self.managers {
            if let Err(e) = manager.start(&self.token) {
                error!(event_type = %manager.event_type(), error = %e, label = e.as_label(), "failed to start manager");
            }
        }
        info!(
            managers = self.managers.len(),
            sinks = self.sinks.len(),
            "agent started"
        );
    }

    /// Cancels every manager, waits for them within the grace period, then closes the sinks.
    ///
    /// Returns [`RuntimeError::GraceExceeded`] if some loops had to be aborted;
    /// the sinks are closed in that case too.
    pub async fn stop(&mut self) -> Result<(), RuntimeError> {
        let span = self.span.clone();
        async {
            info!("stopping agent");
            self.token.cancel();

            let res = self.wait_all_with_grace().await;
            self.close_sinks().await;
            info!("agent stopped");
            res
        }
        .instrument(span)
        .await
    }

    /// Starts the agent, waits for a termination signal, then stops it.
    pub async fn run_until_signal(mut self) -> Result<(), RuntimeError> {
        self.start();
        if let Err(e) = shutdown::wait_for_shutdown_signal().await {
            error!(parent: &self.span, error = %e, "failed to listen for shutdown signals");
        }
        info!(parent: &self.span, "shutdown signal received");
        self.stop().await
    }

    async fn wait_all_with_grace(&mut self) -> Result<(), RuntimeError> {
        let grace = self.grace;
        let done = join_all(self.managers.iter_mut().map(|m| async move {
            let event_type = m.event_type();
            if let Err(e) = m.stop().await {
                warn!(%event_type, error = %e, label = e.as_label(), "manager exited abnormally");
            }
        }));

        let outcome = tokio::time::timeout(grace, done).await;
        match outcome {
            Ok(_) => {
                info!("all managers stopped");
                Ok(())
            }
            Err(_) => {
                let mut stuck = Vec::new();
                for manager in &mut self.managers {
                    if manager.is_running() {
                        stuck.push(manager.event_type().to_string());
                    }
                    manager.abort();
                }
                let err = RuntimeError::GraceExceeded { grace, stuck };
                error!(error = %err, label = err.as_label(), "forcing shutdown");
                Err(err)
            }
        }
    }

    async fn close_sinks(&self) {
        for sink in self.sinks.iter() {
            if let Err(e) = sink.close().await {
                error!(sink = sink.name(), error = %e, label = e.as_label(), "failed to close sink");
            }
        }
    }
}
