//! Tool Registry & Dispatcher.
//!
//! Each concrete tool (file editor, shell runner, JSON editor, code-graph
//! analyzer, MCP bridge) is an external collaborator — only the `Tool`
//! seam and the dispatcher that calls through it live here, the way the
//! teacher's `tools` module separates its `Tool` trait/`ToolRegistry`
//! from the individual tool implementations that plug into it.

mod registry;
mod traits;

pub use registry::ToolRegistry;
pub use traits::{Tool, ToolContext};

/// Tool names recognized as the terminal marker (both spellings coexist
/// upstream and are accepted). Shared by the Base Agent's observation
/// step, the Planner Agent's system prompt, and the Hybrid Agent's
/// planning/execution tool partition.
pub(crate) const TERMINAL_TOOL_NAMES: [&str; 2] = ["complete_task", "task_done"];

/// Tool names recognized as a "sequential thinking" aid. Shared by the
/// Planner Agent's configuration validator and the Hybrid Agent's tool
/// partition.
pub(crate) const THINKING_TOOL_NAMES: [&str; 2] = ["sequential_thinking", "think"];
