//! Configuration module — the Agent factory API's config shape.
//!
//! Split into focused modules the way the teacher splits
//! `src/config/types/*.rs`:
//! - `llm`: provider/model/credentials
//! - `agent`: step budget, working directory, tool list
//! - `docker`: opaque passthrough, ignored by the core
//! - `mcp`: opaque server list, ignored by the core
//! - `logging`: level/format/file
//! - `validation`: structural checks + warnings, consumed by the Planner
//!   Agent's configuration validator
//!
//! File/environment loading is explicitly out of scope — `Config` only
//! implements `Deserialize`/`Serialize` so a caller can load it however it
//! likes (file, env, hardcoded), and this module only validates and
//! consumes the resulting in-memory value.

mod agent;
mod docker;
mod llm;
mod logging;
mod mcp;
mod validation;

pub use agent::AgentConfig;
pub use docker::DockerConfig;
pub use llm::LlmConfig;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use mcp::{McpConfig, McpServerConfig};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};

use serde::{Deserialize, Serialize};

/// Top-level configuration accepted by the Agent factory API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// LLM provider/model configuration.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Agent loop configuration.
    #[serde(default)]
    pub agent: AgentConfig,
    /// Docker provisioning, opaque to the core.
    #[serde(default)]
    pub docker: Option<DockerConfig>,
    /// MCP server list, opaque to the core.
    #[serde(default)]
    pub mcp: McpConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}
