//! Activity recorder
//!
//! Appends one [`ActivityEvent`] per completed search to a sink. Recording
//! is fire-and-forget: sink failures are logged and never reach the user.

use crate::command::UserRef;
use crate::matcher::SearchResult;
use async_trait::async_trait;
use chrono::{Local, Utc};
use sgf_common::activity::ActivityEvent;
use sgf_common::Composition;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Destination of activity events
#[async_trait]
pub trait ActivitySink: Send + Sync {
    async fn append(&self, event: &ActivityEvent) -> sgf_common::Result<()>;
}

/// Appends activity lines to `<dir>/<prefix><YYYYMMDD>.log`
///
/// The date is the local date of the event, so files roll over daily.
pub struct LogFileSink {
    dir: PathBuf,
    prefix: String,
    write_lock: Mutex<()>,
}

impl LogFileSink {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Log file receiving `event`
    pub fn file_for(&self, event: &ActivityEvent) -> PathBuf {
        let date = event.timestamp.with_timezone(&Local).format("%Y%m%d");
        self.dir.join(format!("{}{}.log", self.prefix, date))
    }
}

#[async_trait]
impl ActivitySink for LogFileSink {
    async fn append(&self, event: &ActivityEvent) -> sgf_common::Result<()> {
        let mut line = event.to_log_line()?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_for(event))
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

/// Keeps events in memory
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<ActivityEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events, oldest first
    pub async fn events(&self) -> Vec<ActivityEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl ActivitySink for MemorySink {
    async fn append(&self, event: &ActivityEvent) -> sgf_common::Result<()> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

/// Records completed searches
#[derive(Clone)]
pub struct ActivityRecorder {
    sink: Arc<dyn ActivitySink>,
}

impl ActivityRecorder {
    pub fn new(sink: Arc<dyn ActivitySink>) -> Self {
        Self { sink }
    }

    /// Append one event for a completed search
    pub async fn record(&self, user: &UserRef, composition: &Composition, result: &SearchResult) {
        let event = ActivityEvent {
            timestamp: Utc::now(),
            user_id: user.id,
            username: user.display_name().to_string(),
            composition: composition.to_map(),
            match_kind: result.kind(),
            grades: result.grade_names(),
        };

        info!(
            user_id = user.id,
            match_kind = event.match_kind.as_str(),
            grades = ?event.grades,
            "Search completed"
        );

        if let Err(e) = self.sink.append(&event).await {
            warn!(user_id = user.id, error = %e, "Failed to record search activity");
        }
    }
}
