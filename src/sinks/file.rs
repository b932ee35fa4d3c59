//! # FileSink: append-only newline-delimited JSON file.
//!
//! The file is opened in append mode (created if missing, never truncated) and
//! synced after every line. Once closed, further writes fail with
//! [`SinkError::Closed`].

use std::path::Path;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::Sink;
use crate::error::SinkError;
use crate::events::Envelope;

/// Appends envelopes to a file, one JSON object per line.
pub struct FileSink {
    file: Mutex<Option<File>>,
}

impl FileSink {
    /// Opens (or creates) `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();

        let mut opts = std::fs::OpenOptions::new();
        opts.append(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o644);
        }
        let file = opts.open(path).map_err(|source| SinkError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            file: Mutex::new(Some(File::from_std(file))),
        })
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn write(&self, envelope: &Envelope) -> Result<(), SinkError> {
        let mut line = envelope.to_json()?;
        line.push('\n');

        let mut guard = self.file.lock().await;
        let file = guard.as_mut().ok_or(SinkError::Closed)?;
        file.write_all(line.as_bytes()).await?;
        file.sync_data().await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        let mut guard = self.file.lock().await;
        if let Some(mut file) = guard.take() {
            file.flush().await?;
            file.sync_all().await?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventType;
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};

    fn envelope(secs: i64, message: &str) -> Envelope {
        Envelope::at(
            Utc.timestamp_opt(secs, 0).unwrap(),
            EventType::Job,
            json!({ "message": message }),
        )
    }

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_writes_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        let e1 = envelope(1_640_995_200, "first");
        let e2 = envelope(1_640_995_201, "second");

        let sink = FileSink::open(&path).unwrap();
        sink.write(&e1).await.unwrap();
        sink.write(&e2).await.unwrap();
        sink.close().await.unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(serde_json::from_value::<Envelope>(lines[0].clone()).unwrap(), e1);
        assert_eq!(serde_json::from_value::<Envelope>(lines[1].clone()).unwrap(), e2);
    }

    #[tokio::test]
    async fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");

        let sink = FileSink::open(&path).unwrap();
        sink.write(&envelope(1, "before restart")).await.unwrap();
        sink.close().await.unwrap();

        let sink = FileSink::open(&path).unwrap();
        sink.write(&envelope(2, "after restart")).await.unwrap();
        sink.close().await.unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["data"]["message"], "before restart");
        assert_eq!(lines[1]["data"]["message"], "after restart");
    }

    #[tokio::test]
    async fn test_write_after_close_fails() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::open(dir.path().join("events.json")).unwrap();
        sink.write(&envelope(1, "ok")).await.unwrap();
        sink.close().await.unwrap();

        let err = sink.write(&envelope(2, "late")).await.unwrap_err();
        assert!(matches!(err, SinkError::Closed));
        // Closing twice is harmless.
        sink.close().await.unwrap();
    }

    #[test]
    fn test_invalid_path() {
        let err = FileSink::open("/invalid/path/test").err().unwrap();
        assert_eq!(err.as_label(), "sink_open");
    }
}
