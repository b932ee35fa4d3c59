//! # SinkFanout: at-least-once delivery to every registered sink.
//!
//! Each resource manager owns one [`SinkFanout`]; all fan-outs share the same
//! sink instances.
//!
//! ## What it guarantees
//! - `write_event` attempts delivery on **every** sink, in registration order.
//! - A failing (or panicking) sink is logged and skipped; it never aborts the
//!   caller's poll cycle.
//! - Calls through one fan-out are serialized by its own lock; each sink
//!   additionally serializes its own writes.
//!
//! ## Diagram
//! ```text
//!    write_event(&Envelope)
//!        │  (fan-out lock)
//!        ├──► sink 1 .write()  ── Err ──► log, continue
//!        ├──► sink 2 .write()
//!        └──► sink N .write()
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Mutex;
use tracing::error;

use super::SinkRef;
use crate::events::Envelope;

/// Outcome of one [`SinkFanout::write_event`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub failed: usize,
}

/// Serialized fan-out over a shared, read-only sink set.
pub struct SinkFanout {
    sinks: Arc<[SinkRef]>,
    gate: Mutex<()>,
}

impl SinkFanout {
    #[must_use]
    pub fn new(sinks: Arc<[SinkRef]>) -> Self {
        Self {
            sinks,
            gate: Mutex::new(()),
        }
    }

    /// Delivers `envelope` to every sink. Never fails; see [`Delivery`].
    pub async fn write_event(&self, envelope: &Envelope) -> Delivery {
        let _gate = self.gate.lock().await;
        let mut report = Delivery::default();

        for sink in self.sinks.iter() {
            let res = AssertUnwindSafe(sink.write(envelope)).catch_unwind().await;
            match res {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    error!(
                        sink = sink.name(),
                        event_type = %envelope.kind(),
                        error = %e,
                        label = e.as_label(),
                        "failed to write event to sink"
                    );
                }
                Err(panic_err) => {
                    report.failed += 1;
                    error!(
                        sink = sink.name(),
                        event_type = %envelope.kind(),
                        panic = ?panic_err,
                        "sink panicked while writing event"
                    );
                }
            }
        }
        report
    }

    /// Number of sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// True if there are no sinks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::events::EventType;
    use crate::sinks::Sink;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        writes: AtomicUsize,
    }

    #[async_trait]
    impl Sink for Counting {
        async fn write(&self, _: &Envelope) -> Result<(), SinkError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn close(&self) -> Result<(), SinkError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Failing {
        writes: AtomicUsize,
    }

    #[async_trait]
    impl Sink for Failing {
        async fn write(&self, _: &Envelope) -> Result<(), SinkError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(SinkError::Closed)
        }
        async fn close(&self) -> Result<(), SinkError> {
            Ok(())
        }
    }

    struct Panicking;

    #[async_trait]
    impl Sink for Panicking {
        async fn write(&self, _: &Envelope) -> Result<(), SinkError> {
            panic!("boom");
        }
        async fn close(&self) -> Result<(), SinkError> {
            Ok(())
        }
    }

    fn envelope() -> Envelope {
        Envelope::now(EventType::Job, json!({"ID": "web"}))
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_block_others() {
        let failing = Arc::new(Failing::default());
        let healthy = Arc::new(Counting::default());
        let fanout = SinkFanout::new(Arc::from(vec![
            failing.clone() as SinkRef,
            healthy.clone() as SinkRef,
        ]));

        let report = fanout.write_event(&envelope()).await;

        assert_eq!(failing.writes.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.writes.load(Ordering::SeqCst), 1);
        assert_eq!(report, Delivery { delivered: 1, failed: 1 });
    }

    #[tokio::test]
    async fn test_panicking_sink_is_isolated() {
        let healthy = Arc::new(Counting::default());
        let fanout = SinkFanout::new(Arc::from(vec![
            Arc::new(Panicking) as SinkRef,
            healthy.clone() as SinkRef,
        ]));

        let report = fanout.write_event(&envelope()).await;

        assert_eq!(healthy.writes.load(Ordering::SeqCst), 1);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_every_sink_receives_every_event() {
        let sinks: Vec<Arc<Counting>> = (0..3).map(|_| Arc::new(Counting::default())).collect();
        let fanout = SinkFanout::new(sinks.iter().map(|s| s.clone() as SinkRef).collect());

        for _ in 0..5 {
            fanout.write_event(&envelope()).await;
        }

        assert_eq!(fanout.len(), 3);
        for s in &sinks {
            assert_eq!(s.writes.load(Ordering::SeqCst), 5);
        }
    }
}
