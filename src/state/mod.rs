//! State Manager — registered cells with history and change-watch.
//!
//! Grounded in the same "registry of named, typed slots" shape the
//! teacher uses for its conversation/session maps (`HashMap<String, _>`
//! guarded by a single lock), generalized to arbitrary JSON values with a
//! bounded snapshot ring buffer.

use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tracing::warn;

const DEFAULT_HISTORY_CAPACITY: usize = 50;
const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_millis(100);

/// A point-in-time capture of every registered cell.
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    pub cells: HashMap<String, Value>,
}

struct Inner {
    cells: HashMap<String, Value>,
    history: VecDeque<StateSnapshot>,
    history_capacity: usize,
}

/// Registry of named value cells with bounded history and polling watch.
///
/// Cheaply cloneable; clones share the same underlying state (the teacher
/// wraps its shared maps in `Arc<RwLock<_>>` the same way).
#[derive(Clone)]
pub struct StateManager {
    inner: Arc<RwLock<Inner>>,
}

impl StateManager {
    pub fn new() -> Self {
        Self::with_history_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_history_capacity(history_capacity: usize) -> Self {
        StateManager {
            inner: Arc::new(RwLock::new(Inner {
                cells: HashMap::new(),
                history: VecDeque::with_capacity(history_capacity),
                history_capacity,
            })),
        }
    }

    /// Register `key`, leaving it unset if not already present.
    pub async fn register(&self, key: &str) {
        let mut inner = self.inner.write().await;
        inner.cells.entry(key.to_string()).or_insert(Value::Null);
    }

    /// Set `key`'s value. An unregistered key is auto-registered with a
    /// warning rather than rejected.
    pub async fn set(&self, key: &str, value: Value) {
        let mut inner = self.inner.write().await;
        if !inner.cells.contains_key(key) {
            warn!(key, "state cell set without prior registration; auto-registering");
        }
        inner.cells.insert(key.to_string(), value);
    }

    /// Read `key`'s current value, if registered.
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().await.cells.get(key).cloned()
    }

    /// Capture the full current cell map and push it into the bounded
    /// history, evicting the oldest entry on overflow.
    pub async fn snapshot(&self) -> StateSnapshot {
        let mut inner = self.inner.write().await;
        let snap = StateSnapshot { cells: inner.cells.clone() };
        if inner.history.len() >= inner.history_capacity {
            inner.history.pop_front();
        }
        inner.history.push_back(snap.clone());
        snap
    }

    /// Keys whose current value differs from `snapshot`.
    pub async fn diff(&self, snapshot: &StateSnapshot) -> Vec<String> {
        let inner = self.inner.read().await;
        let mut changed: Vec<String> = inner
            .cells
            .iter()
            .filter(|(k, v)| snapshot.cells.get(*k) != Some(*v))
            .map(|(k, _)| k.clone())
            .collect();
        changed.extend(
            snapshot
                .cells
                .keys()
                .filter(|k| !inner.cells.contains_key(*k))
                .cloned(),
        );
        changed.sort();
        changed.dedup();
        changed
    }

    /// The retained history, oldest first.
    pub async fn history(&self) -> Vec<StateSnapshot> {
        self.inner.read().await.history.iter().cloned().collect()
    }

    /// Poll `key` at `interval` (defaulting to 100ms) and yield its new
    /// value on the returned channel whenever it changes. Dropping the
    /// returned `WatchHandle` stops the poller (the unsubscribe handle).
    pub fn watch(&self, key: &str, interval: Option<Duration>) -> WatchHandle {
        let interval = interval.unwrap_or(DEFAULT_WATCH_INTERVAL);
        let (tx, rx) = mpsc::unbounded_channel();
        let manager = self.clone();
        let key = key.to_string();
        let task = tokio::spawn(async move {
            let mut last = manager.get(&key).await;
            loop {
                tokio::time::sleep(interval).await;
                let current = manager.get(&key).await;
                if current != last {
                    last = current.clone();
                    if tx.send(current).is_err() {
                        break;
                    }
                }
            }
        });
        WatchHandle { task, receiver: rx }
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by `watch`; drop it (or call `unsubscribe`) to stop
/// polling.
pub struct WatchHandle {
    task: tokio::task::JoinHandle<()>,
    receiver: mpsc::UnboundedReceiver<Option<Value>>,
}

impl WatchHandle {
    /// Await the next change notification.
    pub async fn changed(&mut self) -> Option<Option<Value>> {
        self.receiver.recv().await
    }

    /// Stop polling immediately.
    pub fn unsubscribe(self) {
        self.task.abort();
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
