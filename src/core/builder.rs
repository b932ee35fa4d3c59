use std::sync::Arc;
use std::time::Duration;

use tracing::{Span, info_span};

use super::supervisor::Agent;
use crate::{
    client::{ClusterClient, HttpClient},
    config::Settings,
    error::{ConfigError, RuntimeError},
    events::EventType,
    managers::{
        Allocations, Deployments, Evaluations, Jobs, ManagerSettings, Nodes, Resource,
        ResourceManager,
    },
    sinks::{FileSink, SinkKind, SinkRef, StreamSink},
    watch::DEFAULT_ERROR_BACKOFF,
};

/// Builder for an [`Agent`].
///
/// By default the builder creates an [`HttpClient`] for `settings.address` and
/// the sinks listed in `settings.sinks`. Both can be replaced, which is how
/// tests run an agent against an in-memory cluster.
pub struct AgentBuilder {
    settings: Settings,
    client: Option<Arc<dyn ClusterClient>>,
    sinks: Option<Vec<SinkRef>>,
    backoff: Duration,
    span: Option<Span>,
}

impl AgentBuilder {
    /// Creates a new builder from validated settings.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            client: None,
            sinks: None,
            backoff: DEFAULT_ERROR_BACKOFF,
            span: None,
        }
    }

    /// Uses `client` instead of an [`HttpClient`].
    pub fn with_client(mut self, client: Arc<dyn ClusterClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Uses `sinks` instead of the configured sink kinds.
    pub fn with_sinks(mut self, sinks: Vec<SinkRef>) -> Self {
        self.sinks = Some(sinks);
        self
    }

    /// Fixed delay after a failed poll (default [`DEFAULT_ERROR_BACKOFF`]).
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Parent span for the agent and all manager spans.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Builds the agent. Nothing runs until [`Agent::start`].
    ///
    /// Fails if the client cannot be created or a sink cannot be opened.
    pub fn build(self) -> Result<Agent, RuntimeError> {
        let settings = self.settings;

        let client: Arc<dyn ClusterClient> = match self.client {
            Some(client) => client,
            None => Arc::new(HttpClient::new(&settings.address, settings.token.as_deref())?),
        };
        let sinks: Arc<[SinkRef]> = match self.sinks {
            Some(sinks) => sinks.into(),
            None => build_sinks(&settings)?.into(),
        };

        let span = self
            .span
            .unwrap_or_else(|| info_span!("agent", address = %settings.address));

        let managers = resources_for(&settings)
            .into_iter()
            .map(|resource| {
                let manager_settings = ManagerSettings {
                    rate_limit: if resource.event_type() == EventType::Allocation {
                        settings.rate_limit
                    } else {
                        Duration::ZERO
                    },
                    wait_time: settings.wait_time,
                    backoff: self.backoff,
                };
                ResourceManager::new(resource, client.clone(), sinks.clone(), manager_settings, &span)
            })
            .collect();

        Ok(Agent::new_internal(settings.grace, managers, sinks, span))
    }
}

/// Opens the configured sinks, in configuration order.
fn build_sinks(settings: &Settings) -> Result<Vec<SinkRef>, RuntimeError> {
    let mut sinks: Vec<SinkRef> = Vec::with_capacity(settings.sinks.len());
    for kind in &settings.sinks {
        match kind {
            SinkKind::Stdout => sinks.push(Arc::new(StreamSink::stdout())),
            SinkKind::File => {
                let path = settings
                    .file_path
                    .as_ref()
                    .ok_or(ConfigError::MissingFilePath)?;
                sinks.push(Arc::new(FileSink::open(path)?));
            }
        }
    }
    Ok(sinks)
}

/// One resource per requested event type.
///
/// `allocation` and `task` are both served by the allocation manager, which is
/// created once.
fn resources_for(settings: &Settings) -> Vec<Box<dyn Resource>> {
    let mut out: Vec<Box<dyn Resource>> = Vec::new();
    let mut allocations = false;

    for event_type in &settings.event_types {
        match event_type {
            EventType::Allocation | EventType::Task => {
                if !allocations {
                    allocations = true;
                    out.push(Box::new(Allocations));
                }
            }
            EventType::Evaluation => out.push(Box::new(Evaluations)),
            EventType::Node => out.push(Box::new(Nodes)),
            EventType::Job => out.push(Box::new(Jobs)),
            EventType::Deployment => out.push(Box::new(Deployments)),
        }
    }
    out
}
