//! Agent-level configuration — the `agent` section of the factory config.

use serde::{Deserialize, Serialize};

fn default_max_steps() -> u32 {
    30
}

fn default_working_directory() -> String {
    ".".to_string()
}

fn default_true() -> bool {
    true
}

/// Agent configuration block of the Agent factory API's config shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum reasoning steps before the loop is forcefully stopped.
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    /// Working directory handed to tool execution contexts.
    #[serde(default = "default_working_directory")]
    pub working_directory: String,
    /// Whether the Trajectory Recorder is active for this agent.
    #[serde(default = "default_true")]
    pub enable_trajectory_recording: bool,
    /// Ordered list of tool names this agent is allowed to call.
    #[serde(default)]
    pub tools: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            max_steps: default_max_steps(),
            working_directory: default_working_directory(),
            enable_trajectory_recording: true,
            tools: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_agent_config_matches_spec_defaults() {
        let cfg = AgentConfig::default();
        assert_eq!(cfg.max_steps, 30);
        assert_eq!(cfg.working_directory, ".");
        assert!(cfg.enable_trajectory_recording);
    }
}
