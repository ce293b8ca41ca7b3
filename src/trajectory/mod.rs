//! Trajectory Recorder — debounced serialization with a mandatory final
//! flush.
//!
//! The on-disk schema is just the in-memory `AgentTrajectory`; the
//! recorder's only job is deciding *when* to write it to the
//! caller-supplied sink, debouncing bursts of step appends the way the
//! teacher debounces Telegram "typing" indicator updates.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, warn};

use crate::core::AgentTrajectory;
use crate::error::Result;

const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

/// A caller-supplied destination for a serialized trajectory document.
#[async_trait]
pub trait TrajectorySink: Send + Sync {
    async fn write(&self, trajectory: &AgentTrajectory) -> Result<()>;
}

/// Writes a trajectory to a file path as a single JSON document.
pub struct FileSink {
    path: std::path::PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        FileSink { path: path.into() }
    }
}

#[async_trait]
impl TrajectorySink for FileSink {
    async fn write(&self, trajectory: &AgentTrajectory) -> Result<()> {
        let json = serde_json::to_vec_pretty(trajectory)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

/// Debounces writes of an `AgentTrajectory` to a sink.
///
/// `record` marks the trajectory dirty and schedules a flush after the
/// debounce interval; bursts of calls within the window collapse into one
/// write. `flush` forces an immediate write regardless of timing, and is
/// mandatory on every loop exit path.
pub struct TrajectoryRecorder {
    sink: Arc<dyn TrajectorySink>,
    debounce: Duration,
    pending: Arc<Mutex<Option<AgentTrajectory>>>,
    notify: Arc<Notify>,
}

impl TrajectoryRecorder {
    pub fn new(sink: Arc<dyn TrajectorySink>) -> Self {
        Self::with_debounce(sink, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(sink: Arc<dyn TrajectorySink>, debounce: Duration) -> Self {
        let recorder = TrajectoryRecorder { sink, debounce, pending: Arc::new(Mutex::new(None)), notify: Arc::new(Notify::new()) };
        recorder.spawn_flusher();
        recorder
    }

    fn spawn_flusher(&self) {
        let pending = self.pending.clone();
        let notify = self.notify.clone();
        let sink = self.sink.clone();
        let debounce = self.debounce;
        tokio::spawn(async move {
            loop {
                notify.notified().await;
                tokio::time::sleep(debounce).await;
                let to_write = pending.lock().await.take();
                if let Some(trajectory) = to_write {
                    if let Err(err) = sink.write(&trajectory).await {
                        warn!(error = %err, "debounced trajectory flush failed");
                    } else {
                        debug!(steps = trajectory.len(), "debounced trajectory flush complete");
                    }
                }
            }
        });
    }

    /// Mark `trajectory` as the latest snapshot to write; schedules a
    /// debounced flush.
    pub async fn record(&self, trajectory: AgentTrajectory) {
        *self.pending.lock().await = Some(trajectory);
        self.notify.notify_one();
    }

    /// Force an immediate write of `trajectory`, bypassing debounce. Used
    /// for the mandatory final flush on every loop exit path.
    pub async fn flush(&self, trajectory: &AgentTrajectory) -> Result<()> {
        *self.pending.lock().await = None;
        self.sink.write(trajectory).await
    }
}
