//! `LLMClient` trait boundary.
//!
//! Concrete provider adapters are out of scope — this mirrors the seam
//! the teacher's (now-retired) `LlmProvider` trait cut between `core`
//! and the OpenRouter-specific client: the loop only ever talks to this
//! trait, never to a provider's wire format directly.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::core::{Message, RequestedToolCall, ToolDefinition};
use crate::error::Result;

/// Token usage reported by a provider, when available.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Generation parameters passed through to `LLMClient::chat`.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub stop: Option<Vec<String>>,
}

/// The model's response to one `chat` call: content, optional tool
/// calls, optional usage, and the model identifier.
#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub content: String,
    pub tool_calls: Option<Vec<RequestedToolCall>>,
    pub usage: Option<Usage>,
    pub model: String,
    /// Provider-reported stop reason (`"stop"`, `"tool_calls"`, ...),
    /// used by the Base Agent to distinguish a terminal text response
    /// from one still awaiting tool results.
    pub finish_reason: Option<String>,
}

impl LLMResponse {
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// The uniform interface every concrete LLM provider adapter implements.
/// The core never dials a provider itself.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// One reasoning call: send `messages` and, if any tools are
    /// registered, their definitions, and receive a response that may
    /// carry tool calls.
    async fn chat(&self, messages: &[Message], tools: Option<&[ToolDefinition]>, options: &GenerationOptions) -> Result<LLMResponse>;

    /// Stream response chunks (used by streaming callers; not on the core
    /// ReAct loop path).
    async fn stream(&self, messages: &[Message], options: &GenerationOptions) -> Result<BoxStream<'static, Result<String>>>;
}
