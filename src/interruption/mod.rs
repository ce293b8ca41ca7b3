//! Interruption Manager — cooperative cancellation.
//!
//! Grounded in the teacher's `CancellationToken`-less, flag-polling style
//! already used for loop budgets (`agentic_loop.rs` checks `iteration >
//! config.max_iterations` at the top of every pass); generalized into an
//! explicit interrupt flag plus registered handlers, checked at every
//! suspension point the way the loop already checks its iteration bound.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::warn;

/// A handler invoked when `interrupt()` fires.
#[async_trait]
pub trait InterruptHandler: Send + Sync {
    async fn on_interrupt(&self, reason: &str);
}

#[async_trait]
impl<F> InterruptHandler for F
where
    F: Fn(&str) + Send + Sync,
{
    async fn on_interrupt(&self, reason: &str) {
        (self)(reason)
    }
}

struct Inner {
    reason: Option<String>,
    active_tasks: HashSet<String>,
    handlers: Vec<Box<dyn InterruptHandler>>,
}

/// Cooperative cancellation coordinator, shared by clone across an agent
/// invocation and everything it spawns.
#[derive(Clone)]
pub struct InterruptionManager {
    interrupted: Arc<AtomicBool>,
    inner: Arc<RwLock<Inner>>,
}

impl InterruptionManager {
    pub fn new() -> Self {
        InterruptionManager {
            interrupted: Arc::new(AtomicBool::new(false)),
            inner: Arc::new(RwLock::new(Inner {
                reason: None,
                active_tasks: HashSet::new(),
                handlers: Vec::new(),
            })),
        }
    }

    /// Register a handler run (in registration order, with failure
    /// isolation) when `interrupt()` fires.
    pub async fn on_interrupt(&self, handler: Box<dyn InterruptHandler>) {
        self.inner.write().await.handlers.push(handler);
    }

    /// Returns `Err(Error::Interrupted)` if the flag is set.
    pub fn check_interrupted(&self) -> Result<()> {
        if self.interrupted.load(Ordering::SeqCst) {
            return Err(Error::Interrupted(
                self.inner
                    .try_read()
                    .ok()
                    .and_then(|g| g.reason.clone())
                    .unwrap_or_else(|| "interrupted".to_string()),
            ));
        }
        Ok(())
    }

    /// Mark `task_id` active. Paired with `end_task`.
    pub async fn start_task(&self, task_id: impl Into<String>) {
        self.inner.write().await.active_tasks.insert(task_id.into());
    }

    /// Unmark `task_id`.
    pub async fn end_task(&self, task_id: &str) {
        self.inner.write().await.active_tasks.remove(task_id);
    }

    /// Currently active task ids, for observability.
    pub async fn active_tasks(&self) -> Vec<String> {
        self.inner.read().await.active_tasks.iter().cloned().collect()
    }

    /// Transition the flag once (idempotent: a second call is a no-op and
    /// does not re-invoke handlers), then run every registered handler
    /// with failure isolation.
    pub async fn interrupt(&self, reason: impl Into<String>) {
        let already = self.interrupted.swap(true, Ordering::SeqCst);
        if already {
            return;
        }
        let reason = reason.into();
        self.inner.write().await.reason = Some(reason.clone());

        // Failure isolation: each handler runs to completion independent
        // of the others; a panicking handler is not caught here, matching
        // the teacher's convention of only isolating `Result`-returning
        // failures, not unwinding.
        let guard = self.inner.read().await;
        for handler in &guard.handlers {
            handler.on_interrupt(&reason).await;
        }
    }

    /// Track `task_id` for the lifetime of `fut`, surfacing its result
    /// unchanged. Cancellation remains cooperative: `fut` must itself
    /// check `check_interrupted`.
    pub async fn create_cancellable<F, T>(&self, task_id: impl Into<String>, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let task_id = task_id.into();
        self.start_task(task_id.clone()).await;
        let result = fut.await;
        self.end_task(&task_id).await;
        result
    }

    /// Race `fut` against a `duration` timer, failing with
    /// `Error::Timeout` on expiry, clearing the timer on natural
    /// completion.
    pub async fn with_timeout<F, T>(&self, fut: F, duration: Duration, label: &str) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(duration, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(label, ?duration, "operation timed out");
                Err(Error::Timeout(duration, label.to_string()))
            }
        }
    }

    /// Clear the interrupted flag and reason, leaving active tasks and
    /// handlers untouched.
    pub async fn reset(&self) {
        self.interrupted.store(false, Ordering::SeqCst);
        self.inner.write().await.reason = None;
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}

impl Default for InterruptionManager {
    fn default() -> Self {
        Self::new()
    }
}
