//! Tool Registry & Dispatcher.
//!
//! Grounded in the teacher's `ToolRegistry` (name → boxed trait object
//! map), generalized with normalized-name lookup, parallel/sequential
//! dispatch, `tool_call_id` tagging the teacher's single-tool `execute`
//! never needed, and a retrying dispatch variant for connection-class
//! tool faults.

use std::collections::HashMap;

use futures::future::join_all;
use tracing::warn;

use crate::core::{ToolCall, ToolDefinition, ToolResult};
use crate::error::{Error, Result};
use crate::resilience::RetryConfig;

use super::traits::{Tool, ToolContext};

/// Lowercase and strip underscores, so the model calling `Read_File` or
/// `readfile` still resolves to a registered `read_file` tool.
fn normalize(name: &str) -> String {
    name.to_lowercase().replace('_', "")
}

/// Registry of available tools, built once per agent and treated as
/// read-only thereafter.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
    normalized_index: HashMap<String, String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        ToolRegistry { tools: HashMap::new(), normalized_index: HashMap::new() }
    }

    /// Register a tool under its own name.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_boxed(Box::new(tool));
    }

    /// Register an already-boxed tool, e.g. one moved out of a caller's
    /// mixed `Vec<Box<dyn Tool>>` while partitioning it by name (the
    /// Hybrid Agent's planning/execution split).
    pub fn register_boxed(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.normalized_index.insert(normalize(&name), name.clone());
        self.tools.insert(name, tool);
    }

    /// Look up a tool, tolerating the model's naming variation.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        if let Some(tool) = self.tools.get(name) {
            return Some(tool.as_ref());
        }
        let canonical = self.normalized_index.get(&normalize(name))?;
        self.tools.get(canonical).map(|t| t.as_ref())
    }

    /// Every registered tool's definition, for the `LLMClient.chat` call.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// Execute a single tool call: parse-and-dispatch, tagging the result
    /// with `call.id` so observation can pair it deterministically.
    pub async fn execute_tool_call(&self, call: &ToolCall, context: &ToolContext) -> ToolResult {
        let result = match self.get(&call.function_name) {
            Some(tool) => tool.execute(call.arguments.clone(), context).await,
            None => Ok(ToolResult::failure(format!(
                "unknown tool '{}'; known tools: {}",
                call.function_name,
                self.names().join(", "),
            ))),
        };

        let result = result.unwrap_or_else(|err| ToolResult::failure(err.to_string()));
        result.with_tool_call_id(call.id.clone())
    }

    /// Fan out across `calls`, awaiting all of them concurrently. Results
    /// are returned in the same order as `calls`.
    pub async fn parallel_tool_call(&self, calls: &[ToolCall], context: &ToolContext) -> Vec<ToolResult> {
        join_all(calls.iter().map(|call| self.execute_tool_call(call, context))).await
    }

    /// Execute `calls` one at a time, in order.
    pub async fn sequential_tool_call(&self, calls: &[ToolCall], context: &ToolContext) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            results.push(self.execute_tool_call(call, context).await);
        }
        results
    }

    /// Like `execute_tool_call`, but retries connection-class faults per
    /// `retry_config`, mirroring the Base Agent's LLM retry. A tool can
    /// signal a transient fault either by returning `Err` or by
    /// returning `Ok(ToolResult { success: false, .. })` whose error text
    /// looks transient; both are retried the same way.
    pub async fn execute_tool_call_with_retry(&self, call: &ToolCall, context: &ToolContext, retry_config: &RetryConfig) -> ToolResult {
        let Some(tool) = self.get(&call.function_name) else {
            return ToolResult::failure(format!(
                "unknown tool '{}'; known tools: {}",
                call.function_name,
                self.names().join(", "),
            ))
            .with_tool_call_id(call.id.clone());
        };

        let mut attempt = 1;
        loop {
            let (retryable, result) = match tool.execute(call.arguments.clone(), context).await {
                Ok(result) => {
                    let retryable = !result.success && result.error.as_deref().map(Error::looks_transient).unwrap_or(false);
                    (retryable, result)
                }
                Err(err) => (err.is_retryable(), ToolResult::failure(err.to_string())),
            };

            if !retryable || attempt >= retry_config.max_attempts {
                return result.with_tool_call_id(call.id.clone());
            }

            let delay = retry_config.delay_for(attempt);
            warn!(tool = %call.function_name, attempt, max_attempts = retry_config.max_attempts, ?delay, "retrying tool call after transient failure");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// `parallel_tool_call` with the same per-call retry as
    /// `execute_tool_call_with_retry`.
    pub async fn parallel_tool_call_with_retry(&self, calls: &[ToolCall], context: &ToolContext, retry_config: &RetryConfig) -> Vec<ToolResult> {
        join_all(calls.iter().map(|call| self.execute_tool_call_with_retry(call, context, retry_config))).await
    }

    /// Release every tool's resources, swallowing individual errors.
    pub async fn close_tools(&self) {
        for (name, tool) in &self.tools {
            if let Err(err) = tool.close().await {
                warn!(tool = name, error = %err, "tool close failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::RetryConfig;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo_tool"
        }
        fn description(&self) -> &str {
            "echoes its input"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, args: Value, _context: &ToolContext) -> Result<ToolResult> {
            Ok(ToolResult::success(args))
        }
    }

    fn call(id: &str, name: &str) -> ToolCall {
        ToolCall { id: id.to_string(), function_name: name.to_string(), arguments: json!({"x": 1}) }
    }

    #[tokio::test]
    async fn normalized_lookup_tolerates_naming_variation() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);
        assert!(registry.get("echo_tool").is_some());
        assert!(registry.get("EchoTool").is_some());
        assert!(registry.get("echotool").is_some());
    }

    #[tokio::test]
    async fn unknown_tool_enumerates_known_names_in_error() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);
        let context = ToolContext::default();
        let result = registry.execute_tool_call(&call("1", "nonexistent"), &context).await;
        assert!(!result.success);
        assert!(result.error.as_ref().unwrap().contains("echo_tool"));
    }

    #[tokio::test]
    async fn execute_tool_call_tags_result_with_call_id() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);
        let context = ToolContext::default();
        let result = registry.execute_tool_call(&call("call-42", "echo_tool"), &context).await;
        assert_eq!(result.tool_call_id.as_deref(), Some("call-42"));
    }

    #[tokio::test]
    async fn parallel_tool_call_preserves_order() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);
        let context = ToolContext::default();
        let calls = vec![call("a", "echo_tool"), call("b", "echo_tool"), call("c", "echo_tool")];
        let results = registry.parallel_tool_call(&calls, &context).await;
        let ids: Vec<_> = results.iter().map(|r| r.tool_call_id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    /// Fails with a connection-reset-shaped error twice, then succeeds.
    struct FlakyTool {
        calls: Arc<AtomicU32>,
        failures_before_success: u32,
    }

    #[async_trait]
    impl Tool for FlakyTool {
        fn name(&self) -> &str {
            "flaky_tool"
        }
        fn description(&self) -> &str {
            "fails a fixed number of times before succeeding"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, _args: Value, _context: &ToolContext) -> Result<ToolResult> {
            let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures_before_success {
                Ok(ToolResult::failure("ECONNRESET"))
            } else {
                Ok(ToolResult::success_text("recovered"))
            }
        }
    }

    fn retry_config() -> RetryConfig {
        RetryConfig { max_attempts: 3, base_delay: Duration::from_millis(1), max_delay: Duration::from_millis(5), backoff_multiplier: 2.0 }
    }

    #[tokio::test]
    async fn execute_tool_call_with_retry_recovers_from_transient_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut registry = ToolRegistry::new();
        registry.register(FlakyTool { calls: calls.clone(), failures_before_success: 2 });
        let context = ToolContext::default();

        let result = registry.execute_tool_call_with_retry(&call("1", "flaky_tool"), &context, &retry_config()).await;

        assert!(result.success);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn execute_tool_call_with_retry_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut registry = ToolRegistry::new();
        registry.register(FlakyTool { calls: calls.clone(), failures_before_success: 10 });
        let context = ToolContext::default();

        let result = registry.execute_tool_call_with_retry(&call("1", "flaky_tool"), &context, &retry_config()).await;

        assert!(!result.success);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn execute_tool_call_with_retry_does_not_retry_non_transient_failure() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);
        let context = ToolContext::default();

        let result = registry.execute_tool_call_with_retry(&call("1", "nonexistent"), &context, &retry_config()).await;

        assert!(!result.success);
    }
}
