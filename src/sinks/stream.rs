//! # StreamSink: newline-delimited JSON to an async writer.
//!
//! The production instance writes to stdout ([`StreamSink::stdout`]); any
//! `AsyncWrite` works, which keeps the sink testable against an in-memory buffer.
//!
//! ## Example output
//! ```text
//! {"time":"2024-05-01T12:00:00.123Z","type":"node","data":{"ID":"…","ModifyIndex":812}}
//! ```

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

use super::Sink;
use crate::error::SinkError;
use crate::events::Envelope;

/// Writes one JSON line per envelope to `W`.
pub struct StreamSink<W> {
    out: Mutex<W>,
    name: &'static str,
}

impl StreamSink<Stdout> {
    /// Sink writing to the process's standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout(), "stdout")
    }
}

impl<W> StreamSink<W>
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    pub fn new(out: W, name: &'static str) -> Self {
        Self {
            out: Mutex::new(out),
            name,
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<W> Sink for StreamSink<W>
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    async fn write(&self, envelope: &Envelope) -> Result<(), SinkError> {
        let mut line = envelope.to_json()?;
        line.push('\n');

        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes()).await?;
        out.flush().await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        let mut out = self.out.lock().await;
        out.flush().await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
