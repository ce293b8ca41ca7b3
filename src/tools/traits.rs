//! The `Tool` trait boundary.
//!
//! Concrete tool implementations (file editor, shell runner, ...) are out
//! of scope — this crate only defines the seam, the way the teacher's
//! `Tool` trait separates definition from the concrete `ReadFileTool`/
//! `WriteFileTool`/etc. that used to implement it.

use async_trait::async_trait;
use serde_json::Value;

use crate::core::{ToolDefinition, ToolResult};
use crate::error::Result;

/// Execution context handed to a tool alongside its parsed arguments:
/// working directory, environment, and an optional container id.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    pub working_directory: String,
    pub environment: std::collections::HashMap<String, String>,
    pub container: Option<String>,
}

/// A tool that can be invoked by the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool name, as advertised to the model.
    fn name(&self) -> &str;

    /// Human-readable description, surfaced in the tool definition.
    fn description(&self) -> &str;

    /// JSON-Schema describing accepted parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool against already-parsed arguments.
    async fn execute(&self, args: Value, context: &ToolContext) -> Result<ToolResult>;

    /// Release any held resources (subprocess handles, sessions, ...).
    /// Default no-op; the dispatcher calls this on every tool during
    /// `close_tools` and swallows individual errors.
    async fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Render this tool's `ToolDefinition` for the `LLMClient.chat` call.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition { name: self.name().to_string(), description: self.description().to_string(), parameters: self.parameters_schema() }
    }
}
