//! Hook Manager — named callbacks at ten well-known loop phases.
//!
//! Generalizes the teacher's `LoopCallback` trait (a fixed set of
//! `on_iteration_start`/`on_tool_executed`/... methods on one object) into
//! a registry keyed by phase and name, the way a caller composing several
//! independent concerns (logging, metrics, a UI) would want to register
//! and later remove callbacks without owning each other's state.

use crate::core::HookContext;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// The ten well-known phases hooks can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    PreReply,
    PostReply,
    PreReasoning,
    PostReasoning,
    PreActing,
    PostActing,
    PreObservation,
    PostObservation,
    PrePrint,
    PostPrint,
}

/// A registered hook callback.
///
/// `call` receives the `HookContext` and an optional data value; for
/// `execute` the return value is ignored, for `executeTransform` a `Some`
/// return replaces the threaded value.
#[async_trait]
pub trait Hook: Send + Sync {
    async fn call(&self, ctx: &HookContext, value: Option<Value>) -> Result<Option<Value>>;
}

#[async_trait]
impl<F> Hook for F
where
    F: Fn(&HookContext, Option<Value>) -> Result<Option<Value>> + Send + Sync,
{
    async fn call(&self, ctx: &HookContext, value: Option<Value>) -> Result<Option<Value>> {
        (self)(ctx, value)
    }
}

/// Registry of named hooks per phase.
#[derive(Default)]
pub struct HookManager {
    phases: HashMap<HookPhase, Vec<(String, Box<dyn Hook>)>>,
}

impl HookManager {
    pub fn new() -> Self {
        HookManager { phases: HashMap::new() }
    }

    /// Register `hook` under `name` at `phase`. Registering an existing
    /// name replaces the previous callback (idempotent replacement).
    pub fn register(&mut self, phase: HookPhase, name: impl Into<String>, hook: Box<dyn Hook>) {
        let name = name.into();
        let entries = self.phases.entry(phase).or_default();
        if let Some(slot) = entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = hook;
        } else {
            entries.push((name, hook));
        }
    }

    /// Remove a hook by name. Returns whether one was removed.
    pub fn remove(&mut self, phase: HookPhase, name: &str) -> bool {
        if let Some(entries) = self.phases.get_mut(&phase) {
            let before = entries.len();
            entries.retain(|(n, _)| n != name);
            return entries.len() != before;
        }
        false
    }

    /// Invoke every hook registered at `phase`, in registration order.
    /// Each failure is logged and isolated — one misbehaving hook never
    /// aborts the rest of the chain.
    pub async fn execute(&self, phase: HookPhase, ctx: &HookContext, value: Option<Value>) {
        let Some(entries) = self.phases.get(&phase) else { return };
        for (name, hook) in entries {
            if let Err(err) = hook.call(ctx, value.clone()).await {
                warn!(hook = %name, phase = ?phase, error = %err, "hook execution failed");
            }
        }
    }

    /// Thread `value` through every hook registered at `phase`, in
    /// registration order; a hook returning `Some(v)` replaces the value
    /// for subsequent hooks, a hook returning `None` leaves it unchanged.
    /// A failing hook is logged and skipped, leaving the value untouched.
    pub async fn execute_transform(
        &self,
        phase: HookPhase,
        ctx: &HookContext,
        mut value: Option<Value>,
    ) -> Option<Value> {
        let Some(entries) = self.phases.get(&phase) else { return value };
        for (name, hook) in entries {
            match hook.call(ctx, value.clone()).await {
                Ok(Some(next)) => value = Some(next),
                Ok(None) => {}
                Err(err) => {
                    warn!(hook = %name, phase = ?phase, error = %err, "hook transform failed");
                }
            }
        }
        value
    }
}
