//! Base Agent (ReAct Loop) — the heart of the system.
//!
//! Transformed from the teacher's `run_agentic_loop`: the same
//! call-LLM / dispatch-tools / feed-results-back shape, now wired through
//! the Hook Manager, Trajectory Recorder, Interruption Manager, and
//! Resilience Manager instead of a single `LoopCallback` and a bare
//! `Result`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::core::{AgentStep, AgentTrajectory, HookContext, Message, RequestedToolCall, ToolCall, ToolDefinition};
use crate::error::{Error, Result};
use crate::hooks::{HookManager, HookPhase};
use crate::interruption::InterruptionManager;
use crate::llm::{GenerationOptions, LLMClient, LLMResponse};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, RetryConfig};
use crate::tools::{ToolContext, ToolRegistry, TERMINAL_TOOL_NAMES};
use crate::trajectory::TrajectoryRecorder;

use super::repetition::RepetitionGuard;

/// Bound on retained message history; system messages are always kept.
const DEFAULT_MESSAGE_HISTORY_LIMIT: usize = 100;

/// How many consecutive identical tool-name sets trigger a repetition
/// advisory.
const REPETITION_THRESHOLD: usize = 3;

/// Construction parameters for a `BaseAgent`.
pub struct BaseAgentConfig {
    pub agent_id: String,
    pub system_prompt: String,
    pub max_steps: u32,
    pub message_history_limit: usize,
    pub generation_options: GenerationOptions,
    pub retry_config: Option<RetryConfig>,
    pub circuit_breaker_config: Option<CircuitBreakerConfig>,
    pub working_directory: String,
}

impl Default for BaseAgentConfig {
    fn default() -> Self {
        BaseAgentConfig {
            agent_id: uuid::Uuid::new_v4().to_string(),
            system_prompt: String::new(),
            max_steps: 30,
            message_history_limit: DEFAULT_MESSAGE_HISTORY_LIMIT,
            generation_options: GenerationOptions::default(),
            retry_config: Some(RetryConfig::default()),
            circuit_breaker_config: None,
            working_directory: ".".to_string(),
        }
    }
}

/// The ReAct execution loop.
pub struct BaseAgent {
    config: BaseAgentConfig,
    llm_client: Arc<dyn LLMClient>,
    tools: Arc<ToolRegistry>,
    hooks: HookManager,
    interruption: InterruptionManager,
    circuit_breaker: CircuitBreaker,
    trajectory_recorder: Option<Arc<TrajectoryRecorder>>,
}

impl BaseAgent {
    pub fn new(
        config: BaseAgentConfig,
        llm_client: Arc<dyn LLMClient>,
        tools: Arc<ToolRegistry>,
        hooks: HookManager,
        interruption: InterruptionManager,
        trajectory_recorder: Option<Arc<TrajectoryRecorder>>,
    ) -> Self {
        BaseAgent { config, llm_client, tools, hooks, interruption, circuit_breaker: CircuitBreaker::new(), trajectory_recorder }
    }

    pub fn agent_id(&self) -> &str {
        &self.config.agent_id
    }

    /// Run the loop to completion for `objective`.
    pub async fn run(&self, objective: &str) -> Result<AgentTrajectory> {
        let mut messages = vec![Message::system(self.config.system_prompt.clone()), Message::user(objective)];
        let mut trajectory = AgentTrajectory::new(self.config.agent_id.clone(), objective.to_string());
        let mut repetition_guard = RepetitionGuard::new(REPETITION_THRESHOLD);
        let tool_definitions = self.tools.definitions();
        let context = ToolContext { working_directory: self.config.working_directory.clone(), ..Default::default() };

        let hook_ctx = HookContext { agent_id: self.config.agent_id.clone(), task: Some(objective.to_string()), max_steps: Some(self.config.max_steps), ..Default::default() };

        self.hooks.execute(HookPhase::PreReply, &hook_ctx, None).await;

        let outcome = self.run_loop(&mut messages, &mut trajectory, &mut repetition_guard, &tool_definitions, &context, &hook_ctx).await;

        match outcome {
            Ok(()) => {}
            Err(Error::Interrupted(reason)) => {
                warn!(reason = %reason, "agent run interrupted");
                trajectory.finish(false, Some(format!("interrupted: {reason}")));
            }
            Err(err) => {
                trajectory.finish(false, Some(err.to_string()));
                self.final_flush(&trajectory).await;
                self.tools.close_tools().await;
                self.hooks.execute(HookPhase::PostReply, &hook_ctx, None).await;
                return Err(err);
            }
        }

        self.final_flush(&trajectory).await;
        self.tools.close_tools().await;
        self.hooks.execute(HookPhase::PostReply, &hook_ctx, None).await;
        Ok(trajectory)
    }

    async fn run_loop(
        &self,
        messages: &mut Vec<Message>,
        trajectory: &mut AgentTrajectory,
        repetition_guard: &mut RepetitionGuard,
        tool_definitions: &[ToolDefinition],
        context: &ToolContext,
        hook_ctx: &HookContext,
    ) -> Result<()> {
        let mut step_number: u32 = 0;

        loop {
            self.interruption.check_interrupted()?;

            if step_number >= self.config.max_steps {
                trajectory.finish(false, Some("step budget exhausted".to_string()));
                return Ok(());
            }
            step_number += 1;

            let mut step_hook_ctx = hook_ctx.clone();
            step_hook_ctx.step_number = Some(step_number);

            self.truncate_history(messages);

            // --- Reason -----------------------------------------------
            self.hooks.execute(HookPhase::PreReasoning, &step_hook_ctx, None).await;
            let response = self.reason(messages, tool_definitions).await?;
            self.hooks.execute(HookPhase::PostReasoning, &step_hook_ctx, None).await;

            if !response.has_tool_calls() {
                let mut step = AgentStep::new(trajectory.task.clone());
                step.messages = messages.clone();
                step.completed = true;
                step.llm_response_content = Some(response.content.clone());
                trajectory.push_step(step);
                trajectory.finish(true, Some(response.content));
                return Ok(());
            }

            let requested = response.tool_calls.clone().unwrap_or_default();
            let calls = parse_tool_calls(&requested);

            // --- Act ----------------------------------------------------
            self.hooks.execute(HookPhase::PreActing, &step_hook_ctx, None).await;
            self.interruption.check_interrupted()?;
            let results = match &self.config.retry_config {
                Some(retry_config) => self.tools.parallel_tool_call_with_retry(&calls, context, retry_config).await,
                None => self.tools.parallel_tool_call(&calls, context).await,
            };
            self.hooks.execute(HookPhase::PostActing, &step_hook_ctx, None).await;

            // --- Observe --------------------------------------------------
            self.hooks.execute(HookPhase::PreObservation, &step_hook_ctx, None).await;

            let terminal = calls
                .iter()
                .zip(results.iter())
                .find(|(call, result)| TERMINAL_TOOL_NAMES.contains(&call.function_name.as_str()) && result.is_task_completed());

            messages.push(Message::assistant_with_tool_calls(response.content.clone(), requested));
            for result in &results {
                let id = result.tool_call_id.clone().unwrap_or_default();
                messages.push(Message::tool(id, result.to_message_content()));
            }

            let mut step = AgentStep::new(trajectory.task.clone());
            step.messages = messages.clone();
            step.tool_calls = calls.clone();
            step.tool_results = results.clone();
            step.llm_response_content = Some(response.content.clone());

            if let Some((_, terminal_result)) = terminal {
                step.completed = true;
                let summary = terminal_result
                    .result
                    .as_ref()
                    .and_then(|v| v.get("summary"))
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());
                trajectory.push_step(step);
                trajectory.finish(true, summary);
                self.hooks.execute(HookPhase::PostObservation, &step_hook_ctx, None).await;
                return Ok(());
            }

            if let Some(advisory) = repetition_guard.record(calls.iter().map(|c| c.function_name.clone())) {
                step = step.annotate("repetition_detected", serde_json::Value::Bool(true));
                messages.push(Message::system(advisory));
            }

            trajectory.push_step(step);
            self.hooks.execute(HookPhase::PostObservation, &step_hook_ctx, None).await;

            if let Some(recorder) = &self.trajectory_recorder {
                recorder.record(trajectory.clone()).await;
            }
        }
    }

    async fn reason(&self, messages: &[Message], tool_definitions: &[ToolDefinition]) -> Result<LLMResponse> {
        let llm_client = self.llm_client.clone();
        let options = self.config.generation_options.clone();
        let messages = messages.to_vec();
        let tools = tool_definitions.to_vec();

        let operation = move || {
            let llm_client = llm_client.clone();
            let messages = messages.clone();
            let tools = tools.clone();
            let options = options.clone();
            async move { llm_client.chat(&messages, Some(&tools), &options).await }
        };

        self.interruption
            .with_timeout(
                crate::resilience::with_resilience(&self.circuit_breaker, "llm", self.config.circuit_breaker_config.clone(), self.config.retry_config.clone(), operation),
                Duration::from_secs(120),
                "llm_reasoning",
            )
            .await
    }

    /// Keep all system messages plus the most recent entries up to
    /// `message_history_limit`.
    fn truncate_history(&self, messages: &mut Vec<Message>) {
        let limit = self.config.message_history_limit;
        if messages.len() <= limit {
            return;
        }

        let (system, rest): (Vec<Message>, Vec<Message>) = messages.drain(..).partition(|m| m.role == crate::core::Role::System);
        let keep = limit.saturating_sub(system.len());
        let trimmed_rest: Vec<Message> = if rest.len() > keep { rest[rest.len() - keep..].to_vec() } else { rest };

        *messages = system;
        messages.extend(trimmed_rest);
        info!(new_len = messages.len(), limit, "truncated message history");
    }

    async fn final_flush(&self, trajectory: &AgentTrajectory) {
        if let Some(recorder) = &self.trajectory_recorder {
            if let Err(err) = recorder.flush(trajectory).await {
                warn!(error = %err, "final trajectory flush failed");
            }
        }
    }
}

fn parse_tool_calls(requested: &[RequestedToolCall]) -> Vec<ToolCall> {
    requested
        .iter()
        .map(|rc| {
            let arguments = serde_json::from_str(&rc.arguments).unwrap_or_else(|err| {
                warn!(tool = %rc.function_name, error = %err, "failed to parse tool arguments, defaulting to empty object");
                serde_json::json!({})
            });
            ToolCall { id: rc.id.clone(), function_name: rc.function_name.clone(), arguments }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockLLMClient;
    use crate::llm::Usage;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct AlwaysSucceedTool;

    #[async_trait]
    impl crate::tools::Tool for AlwaysSucceedTool {
        fn name(&self) -> &str {
            "edit_tool"
        }
        fn description(&self) -> &str {
            "pretends to edit something"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, _args: Value, _context: &ToolContext) -> Result<crate::core::ToolResult> {
            Ok(crate::core::ToolResult::success_text("edited"))
        }
    }

    struct CompleteTaskTool;

    #[async_trait]
    impl crate::tools::Tool for CompleteTaskTool {
        fn name(&self) -> &str {
            "complete_task"
        }
        fn description(&self) -> &str {
            "signals task completion"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, _args: Value, _context: &ToolContext) -> Result<crate::core::ToolResult> {
            Ok(crate::core::ToolResult::success(json!({"task_completed": true, "result": "ok", "summary": "s"})))
        }
    }

    fn tool_call_response(id: &str, name: &str) -> LLMResponse {
        LLMResponse {
            content: "working on it".into(),
            tool_calls: Some(vec![RequestedToolCall { id: id.into(), function_name: name.into(), arguments: "{}".into() }]),
            usage: Some(Usage::default()),
            model: "mock".into(),
            finish_reason: Some("tool_calls".into()),
        }
    }

    fn agent(llm: MockLLMClient, registry: ToolRegistry) -> BaseAgent {
        BaseAgent::new(
            BaseAgentConfig { max_steps: 5, ..Default::default() },
            Arc::new(llm),
            Arc::new(registry),
            HookManager::new(),
            InterruptionManager::new(),
            None,
        )
    }

    #[tokio::test]
    async fn terminal_on_first_reasoning() {
        let llm = MockLLMClient::new(vec![LLMResponse {
            content: "done".into(),
            tool_calls: None,
            usage: None,
            model: "mock".into(),
            finish_reason: Some("stop".into()),
        }]);
        let registry = ToolRegistry::new();
        let base = agent(llm, registry);

        let trajectory = base.run("say hello").await.unwrap();
        assert_eq!(trajectory.len(), 1);
        assert!(trajectory.completed);
        assert!(trajectory.success);
        assert_eq!(trajectory.steps[0].llm_response_content.as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn single_tool_then_terminal() {
        let llm = MockLLMClient::new(vec![
            tool_call_response("call-1", "edit_tool"),
            tool_call_response("call-2", "complete_task"),
        ]);
        let mut registry = ToolRegistry::new();
        registry.register(AlwaysSucceedTool);
        registry.register(CompleteTaskTool);
        let base = agent(llm, registry);

        let trajectory = base.run("edit then finish").await.unwrap();
        assert_eq!(trajectory.len(), 2);
        assert!(trajectory.steps[1].completed);
        assert!(trajectory.success);
    }

    #[tokio::test]
    async fn budget_exhaustion_marks_failed_completion() {
        let llm = MockLLMClient::new(vec![
            tool_call_response("1", "edit_tool"),
            tool_call_response("2", "edit_tool"),
            tool_call_response("3", "edit_tool"),
        ]);
        let mut registry = ToolRegistry::new();
        registry.register(AlwaysSucceedTool);
        let mut config = BaseAgentConfig { max_steps: 3, ..Default::default() };
        config.retry_config = None;
        let base = BaseAgent::new(config, Arc::new(llm), Arc::new(registry), HookManager::new(), InterruptionManager::new(), None);

        let trajectory = base.run("loop forever").await.unwrap();
        assert_eq!(trajectory.len(), 3);
        assert!(trajectory.completed);
        assert!(!trajectory.success);
        assert!(trajectory.end_time.is_some());
    }

    #[tokio::test]
    async fn interruption_produces_failed_completion_without_error() {
        let llm = MockLLMClient::new(vec![tool_call_response("1", "edit_tool")]);
        let mut registry = ToolRegistry::new();
        registry.register(AlwaysSucceedTool);
        let interruption = InterruptionManager::new();
        interruption.interrupt("stop").await;
        let base = BaseAgent::new(BaseAgentConfig::default(), Arc::new(llm), Arc::new(registry), HookManager::new(), interruption, None);

        let trajectory = base.run("do something").await.unwrap();
        assert!(trajectory.completed);
        assert!(!trajectory.success);
    }

    /// Fails with an `ECONNRESET`-shaped error twice, then succeeds with
    /// the terminal marker.
    struct FlakyCompleteTaskTool {
        calls: std::sync::Arc<std::sync::atomic::AtomicU32>,
    }

    #[async_trait]
    impl crate::tools::Tool for FlakyCompleteTaskTool {
        fn name(&self) -> &str {
            "complete_task"
        }
        fn description(&self) -> &str {
            "fails twice with a connection-reset-shaped error, then completes"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, _args: Value, _context: &ToolContext) -> Result<crate::core::ToolResult> {
            let attempt = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if attempt < 2 {
                Ok(crate::core::ToolResult::failure("ECONNRESET"))
            } else {
                Ok(crate::core::ToolResult::success(json!({"task_completed": true, "result": "ok", "summary": "recovered"})))
            }
        }
    }

    #[tokio::test]
    async fn retries_transient_tool_failure_then_succeeds() {
        let llm = MockLLMClient::new(vec![tool_call_response("call-1", "complete_task")]);
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
        let mut registry = ToolRegistry::new();
        registry.register(FlakyCompleteTaskTool { calls: calls.clone() });

        let mut config = BaseAgentConfig { max_steps: 5, ..Default::default() };
        config.retry_config = Some(RetryConfig { max_attempts: 3, base_delay: Duration::from_millis(1), max_delay: Duration::from_millis(5), backoff_multiplier: 2.0 });
        let base = BaseAgent::new(config, Arc::new(llm), Arc::new(registry), HookManager::new(), InterruptionManager::new(), None);

        let trajectory = base.run("do something flaky").await.unwrap();

        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 3);
        assert!(trajectory.success);
        assert_eq!(trajectory.len(), 1);
        assert!(trajectory.steps[0].tool_results[0].success);
    }
}
