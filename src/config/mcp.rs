//! MCP (Model Context Protocol) server configuration — each entry is just
//! name/command/args/env, opaque to the core.

use serde::{Deserialize, Serialize};

/// One configured MCP server entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Server name, used for display/logging only.
    pub name: String,
    /// Command used to launch the server.
    pub command: String,
    /// Command-line arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables to set for the server process.
    #[serde(default)]
    pub env: std::collections::HashMap<String, String>,
}

/// MCP configuration block of the Agent factory API's config shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpConfig {
    /// Configured MCP servers. The core does not connect to these itself —
    /// an MCP bridge tool implementation (out of scope here) does, and
    /// surfaces the result as ordinary `Tool` registrations.
    #[serde(default)]
    pub servers: Vec<McpServerConfig>,
}
