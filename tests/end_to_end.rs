//! Black-box end-to-end scenarios driven entirely through the crate's
//! public surface: a scripted `LLMClient`, a couple of in-memory `Tool`
//! fixtures, and `BaseAgent`/`HybridAgent`/`PlannerTool`. These exercise
//! whole-loop behavior that doesn't belong inside any single module's
//! unit tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::{json, Value};

use openagent_core::agent::{BaseAgent, BaseAgentConfig};
use openagent_core::core::{Message, RequestedToolCall, ToolDefinition};
use openagent_core::error::Result;
use openagent_core::hooks::HookManager;
use openagent_core::hybrid::{HybridAgent, HybridAgentConfig};
use openagent_core::interruption::InterruptionManager;
use openagent_core::llm::{GenerationOptions, LLMClient, LLMResponse, Usage};
use openagent_core::planner::PlannerTool;
use openagent_core::tools::{Tool, ToolContext, ToolRegistry};
use openagent_core::ToolResult;

/// A scripted client returning one queued response per call, in order.
struct ScriptedClient {
    responses: Mutex<Vec<LLMResponse>>,
}

impl ScriptedClient {
    fn new(responses: Vec<LLMResponse>) -> Self {
        ScriptedClient { responses: Mutex::new(responses) }
    }
}

#[async_trait]
impl LLMClient for ScriptedClient {
    async fn chat(&self, _messages: &[Message], _tools: Option<&[ToolDefinition]>, _options: &GenerationOptions) -> Result<LLMResponse> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(openagent_core::Error::Llm("scripted client exhausted".into()));
        }
        Ok(responses.remove(0))
    }

    async fn stream(&self, _messages: &[Message], _options: &GenerationOptions) -> Result<BoxStream<'static, Result<String>>> {
        use futures::stream;
        Ok(Box::pin(stream::empty()))
    }
}

fn terminal(content: &str) -> LLMResponse {
    LLMResponse { content: content.into(), tool_calls: None, usage: None, model: "mock".into(), finish_reason: Some("stop".into()) }
}

fn tool_call(id: &str, name: &str, arguments: &str) -> LLMResponse {
    LLMResponse {
        content: "working".into(),
        tool_calls: Some(vec![RequestedToolCall { id: id.into(), function_name: name.into(), arguments: arguments.into() }]),
        usage: Some(Usage::default()),
        model: "mock".into(),
        finish_reason: Some("tool_calls".into()),
    }
}

struct EditTool;
#[async_trait]
impl Tool for EditTool {
    fn name(&self) -> &str {
        "edit_tool"
    }
    fn description(&self) -> &str {
        "pretends to edit a file"
    }
    fn parameters_schema(&self) -> Value {
        json!({"type": "object"})
    }
    async fn execute(&self, _args: Value, _context: &ToolContext) -> Result<ToolResult> {
        Ok(ToolResult::success_text("edited"))
    }
}

struct CompleteTaskTool;
#[async_trait]
impl Tool for CompleteTaskTool {
    fn name(&self) -> &str {
        "complete_task"
    }
    fn description(&self) -> &str {
        "signals task completion"
    }
    fn parameters_schema(&self) -> Value {
        json!({"type": "object"})
    }
    async fn execute(&self, _args: Value, _context: &ToolContext) -> Result<ToolResult> {
        Ok(ToolResult::success(json!({"task_completed": true, "result": "ok", "summary": "s"})))
    }
}

struct FlakyConnResetTool {
    calls: Arc<AtomicU32>,
}
#[async_trait]
impl Tool for FlakyConnResetTool {
    fn name(&self) -> &str {
        "complete_task"
    }
    fn description(&self) -> &str {
        "fails twice with ECONNRESET, then completes"
    }
    fn parameters_schema(&self) -> Value {
        json!({"type": "object"})
    }
    async fn execute(&self, _args: Value, _context: &ToolContext) -> Result<ToolResult> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
        if attempt < 2 {
            Ok(ToolResult::failure("ECONNRESET"))
        } else {
            Ok(ToolResult::success(json!({"task_completed": true, "result": "ok", "summary": "recovered"})))
        }
    }
}

struct ThinkingTool;
#[async_trait]
impl Tool for ThinkingTool {
    fn name(&self) -> &str {
        "sequential_thinking"
    }
    fn description(&self) -> &str {
        "scratch space"
    }
    fn parameters_schema(&self) -> Value {
        json!({"type": "object"})
    }
    async fn execute(&self, _args: Value, _context: &ToolContext) -> Result<ToolResult> {
        Ok(ToolResult::success_text("noted"))
    }
}

struct CreateDirTool;
#[async_trait]
impl Tool for CreateDirTool {
    fn name(&self) -> &str {
        "create_dir"
    }
    fn description(&self) -> &str {
        "creates a directory"
    }
    fn parameters_schema(&self) -> Value {
        json!({"type": "object"})
    }
    async fn execute(&self, _args: Value, _context: &ToolContext) -> Result<ToolResult> {
        Ok(ToolResult::success_text("created"))
    }
}

struct WriteFileTool;
#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }
    fn description(&self) -> &str {
        "writes a file"
    }
    fn parameters_schema(&self) -> Value {
        json!({"type": "object"})
    }
    async fn execute(&self, _args: Value, _context: &ToolContext) -> Result<ToolResult> {
        Ok(ToolResult::success_text("written"))
    }
}

fn base_agent(llm: ScriptedClient, registry: ToolRegistry, max_steps: u32) -> BaseAgent {
    BaseAgent::new(
        BaseAgentConfig { max_steps, ..Default::default() },
        Arc::new(llm),
        Arc::new(registry),
        HookManager::new(),
        InterruptionManager::new(),
        None,
    )
}

/// Scenario 1: terminal on first reasoning.
#[tokio::test]
async fn scenario_terminal_on_first_reasoning() {
    let llm = ScriptedClient::new(vec![terminal("done")]);
    let agent = base_agent(llm, ToolRegistry::new(), 5);

    let trajectory = agent.run("say hello").await.unwrap();

    assert_eq!(trajectory.len(), 1);
    assert!(trajectory.completed);
    assert!(trajectory.success);
    assert_eq!(trajectory.steps[0].llm_response_content.as_deref(), Some("done"));
}

/// Scenario 2: one ordinary tool call, then the terminal marker tool.
#[tokio::test]
async fn scenario_single_tool_then_terminal() {
    let llm = ScriptedClient::new(vec![tool_call("c1", "edit_tool", "{}"), tool_call("c2", "complete_task", "{}")]);
    let mut registry = ToolRegistry::new();
    registry.register(EditTool);
    registry.register(CompleteTaskTool);
    let agent = base_agent(llm, registry, 5);

    let trajectory = agent.run("edit then finish").await.unwrap();

    assert_eq!(trajectory.len(), 2);
    assert!(trajectory.steps[1].completed);
    assert!(trajectory.success);
    let last_tool_message = trajectory.steps[1].messages.iter().rev().find(|m| m.role == openagent_core::Role::Tool).unwrap();
    assert_eq!(last_tool_message.tool_call_id.as_deref(), Some("c2"));
}

/// Scenario 3: budget exhaustion with a tool that never emits the
/// terminal marker.
#[tokio::test]
async fn scenario_budget_exhaustion() {
    let llm = ScriptedClient::new(vec![tool_call("1", "edit_tool", "{}"), tool_call("2", "edit_tool", "{}"), tool_call("3", "edit_tool", "{}")]);
    let mut registry = ToolRegistry::new();
    registry.register(EditTool);
    let mut config = BaseAgentConfig { max_steps: 3, ..Default::default() };
    config.retry_config = None;
    let agent = BaseAgent::new(config, Arc::new(llm), Arc::new(registry), HookManager::new(), InterruptionManager::new(), None);

    let trajectory = agent.run("loop forever").await.unwrap();

    assert_eq!(trajectory.len(), 3);
    assert!(trajectory.completed);
    assert!(!trajectory.success);
    assert!(trajectory.end_time.is_some());
}

/// Scenario 4: planner + hybrid happy path, two tasks in order.
#[tokio::test]
async fn scenario_planner_and_hybrid_happy_path() {
    let planner_tool = PlannerTool::new();
    let create_args = json!({
        "operation": "create_plan_with_tasks",
        "objective": "create file X with content Y",
        "tasks": [{"title": "create_dir"}, {"title": "write_file"}]
    })
    .to_string();

    let llm = ScriptedClient::new(vec![
        tool_call("p1", openagent_core::planner::PLANNER_TOOL_NAME, &create_args),
        tool_call("p2", "complete_task", "{}"),
        terminal("created the directory"),
        terminal("wrote the file"),
    ]);

    let tools: Vec<Box<dyn Tool>> =
        vec![Box::new(planner_tool.clone()), Box::new(ThinkingTool), Box::new(CompleteTaskTool), Box::new(CreateDirTool), Box::new(WriteFileTool)];

    let hybrid = HybridAgent::new(
        HybridAgentConfig::default(),
        Arc::new(llm),
        planner_tool,
        tools,
        HookManager::new(),
        InterruptionManager::new(),
        None,
    )
    .unwrap();

    let trajectory = hybrid.run("create file X with content Y").await.unwrap();

    assert!(trajectory.success);
    assert_eq!(trajectory.len(), 3);
    let plan = hybrid.current_plan().await.unwrap();
    assert_eq!(plan.progress, 1.0);
}

/// Scenario 5: a tool fails with a connection-reset-shaped error twice,
/// then succeeds with the terminal marker; retry config absorbs the
/// transient failures within one observed step.
#[tokio::test]
async fn scenario_retry_on_transient_tool_error() {
    let llm = ScriptedClient::new(vec![tool_call("1", "complete_task", "{}")]);
    let calls = Arc::new(AtomicU32::new(0));
    let mut registry = ToolRegistry::new();
    registry.register(FlakyConnResetTool { calls: calls.clone() });

    let mut config = BaseAgentConfig { max_steps: 2, ..Default::default() };
    config.retry_config = Some(openagent_core::resilience::RetryConfig {
        max_attempts: 3,
        base_delay: std::time::Duration::from_millis(1),
        max_delay: std::time::Duration::from_millis(5),
        backoff_multiplier: 2.0,
    });
    let agent = BaseAgent::new(config, Arc::new(llm), Arc::new(registry), HookManager::new(), InterruptionManager::new(), None);

    let trajectory = agent.run("do something flaky").await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(trajectory.success);
    assert_eq!(trajectory.len(), 1);
    assert!(trajectory.steps[0].tool_results[0].success);
}

/// Scenario 6: cooperative interruption during reasoning short-circuits
/// the loop into a graceful failed completion, tools still closed.
#[tokio::test]
async fn scenario_cooperative_interruption() {
    let llm = ScriptedClient::new(vec![tool_call("1", "edit_tool", "{}")]);
    let mut registry = ToolRegistry::new();
    registry.register(EditTool);
    let interruption = InterruptionManager::new();
    interruption.interrupt("stop").await;
    let agent = BaseAgent::new(BaseAgentConfig::default(), Arc::new(llm), Arc::new(registry), HookManager::new(), interruption, None);

    let trajectory = agent.run("do something").await.unwrap();

    assert!(trajectory.completed);
    assert!(!trajectory.success);
    assert!(trajectory.end_time.is_some());
}
