//! Core data model shared across the agent, planner, and hybrid loops.
//!
//! This module holds the types every other module builds on: conversation
//! `Message`s, the `ToolCall`/`ToolResult` pair exchanged with the Tool
//! Registry, the append-only `AgentStep`/`AgentTrajectory` record of one
//! agent invocation, and `HookContext`, the open extension map passed to
//! hook callbacks.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message providing context and instructions.
    System,
    /// User message.
    User,
    /// Assistant (model) response.
    Assistant,
    /// Tool/function result.
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A message in a conversation.
///
/// Invariants enforced by the constructors below rather than at the type
/// level (mirroring the teacher's approach): a `tool` message always
/// carries `tool_call_id`; an `assistant` message with `tool_calls` may
/// have empty content but construction helpers never produce a message
/// with both empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender.
    pub role: Role,
    /// Content of the message.
    pub content: String,
    /// Optional name (for tool messages, or named participants).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tool call id this message answers (only set on `tool` messages).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool calls requested by the assistant in this message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<RequestedToolCall>>,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Message { role: Role::System, content: content.into(), name: None, tool_call_id: None, tool_calls: None }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message { role: Role::User, content: content.into(), name: None, tool_call_id: None, tool_calls: None }
    }

    /// Create a new assistant message with text content and no tool calls.
    pub fn assistant(content: impl Into<String>) -> Self {
        Message { role: Role::Assistant, content: content.into(), name: None, tool_call_id: None, tool_calls: None }
    }

    /// Create an assistant message that requested tool calls. `content`
    /// may be empty, since content and tool_calls cannot both be empty —
    /// `tool_calls` must be non-empty here.
    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<RequestedToolCall>) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
            name: None,
            tool_call_id: None,
            tool_calls: Some(tool_calls),
        }
    }

    /// Create a new tool result message, bound to the originating call id.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Message {
            role: Role::Tool,
            content: content.into(),
            name: None,
            tool_call_id: Some(tool_call_id.into()),
            tool_calls: None,
        }
    }

    /// True for `assistant` messages carrying at least one tool call.
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// A tool call as it appears attached to an assistant `Message`
/// (the wire shape; distinct from the dispatcher-facing `ToolCall` below,
/// which carries parsed arguments).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedToolCall {
    /// Unique id for this call, unique within the response that issued it.
    pub id: String,
    /// Name of the function/tool to invoke.
    pub function_name: String,
    /// Arguments, still encoded as a JSON string (as the model produced them).
    pub arguments: String,
}

/// A parsed tool call ready for dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Id binding this call to its `RequestedToolCall` and to the eventual
    /// `ToolResult.tool_call_id`.
    pub id: String,
    /// Name of the tool to invoke.
    pub function_name: String,
    /// Parsed JSON arguments.
    pub arguments: serde_json::Value,
}

/// Result of executing a single `ToolCall`.
///
/// Invariant: when `success` is false, `error` is non-empty; when true,
/// `result` holds the tool-specific payload. Constructors enforce this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the execution succeeded.
    pub success: bool,
    /// Result payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Captured stdout, for shell-like tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    /// Captured stderr, for shell-like tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    /// The originating `ToolCall.id`, so observation can pair results
    /// deterministically.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ToolResult {
    /// Build a successful result.
    pub fn success(result: serde_json::Value) -> Self {
        ToolResult { success: true, result: Some(result), error: None, stdout: None, stderr: None, tool_call_id: None }
    }

    /// Build a successful result carrying only a string payload.
    pub fn success_text(text: impl Into<String>) -> Self {
        Self::success(serde_json::Value::String(text.into()))
    }

    /// Build a failed result. Panics in debug builds if `error` is empty —
    /// callers should never construct an empty-error failure.
    pub fn failure(error: impl Into<String>) -> Self {
        let error = error.into();
        debug_assert!(!error.is_empty(), "ToolResult::failure requires a non-empty error");
        ToolResult { success: false, result: None, error: Some(error), stdout: None, stderr: None, tool_call_id: None }
    }

    /// Attach stdout/stderr captured alongside the result.
    pub fn with_output(mut self, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.stdout = Some(stdout.into());
        self.stderr = Some(stderr.into());
        self
    }

    /// Bind this result to the tool call it answers.
    pub fn with_tool_call_id(mut self, id: impl Into<String>) -> Self {
        self.tool_call_id = Some(id.into());
        self
    }

    /// Whether this result carries the terminal-tool marker
    /// (`task_completed: true` in a structured result).
    pub fn is_task_completed(&self) -> bool {
        self.success
            && self
                .result
                .as_ref()
                .and_then(|v| v.get("task_completed"))
                .and_then(|v| v.as_bool())
                .unwrap_or(false)
    }

    /// Render a string form suitable for feeding back to the model as a
    /// `tool` message's content.
    pub fn to_message_content(&self) -> String {
        if self.success {
            self.result
                .as_ref()
                .map(|v| if v.is_string() { v.as_str().unwrap().to_string() } else { v.to_string() })
                .unwrap_or_default()
        } else {
            format!("Error: {}", self.error.as_deref().unwrap_or("unknown error"))
        }
    }
}

/// One full Reason → Act → Observe pass.
///
/// Append-only: never mutated once pushed onto an `AgentTrajectory`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStep {
    /// Fresh unique id for this step.
    pub step_id: String,
    /// The objective this step belongs to.
    pub task: String,
    /// Snapshot of the message history at the time this step was recorded.
    pub messages: Vec<Message>,
    /// Tool calls issued during this step's Act phase.
    pub tool_calls: Vec<ToolCall>,
    /// Tool results received during this step's Observe phase.
    pub tool_results: Vec<ToolResult>,
    /// Whether this step terminated the loop (final step).
    pub completed: bool,
    /// Wall-clock time the step was recorded.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Raw LLM response content for this step's Reason phase, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_response_content: Option<String>,
    /// Bounded annotation map for ad-hoc, optional step metadata
    /// (e.g. `repetition_detected`), rather than stashing arbitrary
    /// properties directly on the step object.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub annotations: HashMap<String, serde_json::Value>,
}

impl AgentStep {
    /// Start building a new step for the given objective.
    pub fn new(task: impl Into<String>) -> Self {
        AgentStep {
            step_id: Uuid::new_v4().to_string(),
            task: task.into(),
            messages: Vec::new(),
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
            completed: false,
            timestamp: chrono::Utc::now(),
            llm_response_content: None,
            annotations: HashMap::new(),
        }
    }

    /// Record a bounded annotation (e.g. `"repetition_detected" => true`).
    pub fn annotate(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.annotations.insert(key.into(), value);
        self
    }
}

/// Append-only log of steps and terminal flags for one agent invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTrajectory {
    /// Identifier of the agent that produced this trajectory.
    pub agent_id: String,
    /// The objective this trajectory is for.
    pub task: String,
    /// Ordered, append-only steps.
    pub steps: Vec<AgentStep>,
    /// Whether the invocation has finished (successfully or not).
    pub completed: bool,
    /// Whether the invocation finished successfully.
    pub success: bool,
    /// Final textual result, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_result: Option<String>,
    /// When the invocation started.
    pub start_time: chrono::DateTime<chrono::Utc>,
    /// When the invocation ended, set iff `completed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
}

impl AgentTrajectory {
    /// Start a new, empty trajectory for `agent_id` working on `task`.
    pub fn new(agent_id: impl Into<String>, task: impl Into<String>) -> Self {
        AgentTrajectory {
            agent_id: agent_id.into(),
            task: task.into(),
            steps: Vec::new(),
            completed: false,
            success: false,
            final_result: None,
            start_time: chrono::Utc::now(),
            end_time: None,
        }
    }

    /// Append a step. Steps are never mutated after this call.
    pub fn push_step(&mut self, step: AgentStep) {
        self.steps.push(step);
    }

    /// Mark the trajectory as finished. `success ⇒ completed` is upheld by
    /// construction: this is the only way to set `completed`, and it
    /// always stamps `end_time`.
    pub fn finish(&mut self, success: bool, final_result: Option<String>) {
        self.completed = true;
        self.success = success;
        self.final_result = final_result;
        self.end_time = Some(chrono::Utc::now());
    }

    /// Number of steps recorded so far.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether any steps have been recorded.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// A tool definition as handed to `LLMClient.chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name, as advertised to the model.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON-Schema describing accepted parameters.
    pub parameters: serde_json::Value,
}

/// Context passed to hook callbacks.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HookContext {
    /// Identifier of the agent invoking the hook.
    pub agent_id: String,
    /// Current task/objective, if applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    /// Current step number, if applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_number: Option<u32>,
    /// Configured maximum step count, if applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<u32>,
    /// Open extension map for caller-defined context.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Session/user/agent identifiers, kept as transparent aliases matching
/// the teacher's convention in `core/types.rs`.
pub type AgentId = String;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors_set_expected_fields() {
        let m = Message::user("hi");
        assert_eq!(m.role, Role::User);
        assert!(!m.has_tool_calls());

        let t = Message::tool("call-1", "ok");
        assert_eq!(t.role, Role::Tool);
        assert_eq!(t.tool_call_id.as_deref(), Some("call-1"));
    }

    #[test]
    fn tool_result_task_completed_marker() {
        let r = ToolResult::success(serde_json::json!({"task_completed": true, "summary": "done"}));
        assert!(r.is_task_completed());

        let r2 = ToolResult::success(serde_json::json!({"ok": true}));
        assert!(!r2.is_task_completed());

        let r3 = ToolResult::failure("boom");
        assert!(!r3.is_task_completed());
    }

    #[test]
    fn trajectory_finish_sets_end_time_and_completed() {
        let mut traj = AgentTrajectory::new("agent-1", "do thing");
        assert!(!traj.completed);
        traj.push_step(AgentStep::new("do thing"));
        traj.finish(true, Some("done".into()));
        assert!(traj.completed);
        assert!(traj.success);
        assert!(traj.end_time.is_some());
        assert_eq!(traj.len(), 1);
    }
}
