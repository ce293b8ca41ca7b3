//! Configuration validation
//!
//! Validates configuration and reports issues. Adapted from the teacher's
//! issue-collecting validation shape. The Planner Agent's configuration
//! validator — which rejects construction if the planning tool or the
//! thinking tool is absent — is a stricter, agent-specific check built on
//! top of this one; see `crate::planner::agent::PlannerAgent::new`.

use super::Config;

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Validate the configuration against the Agent factory API shape.
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_llm_config(config, result);
    result = validate_agent_config(config, result);
    result = validate_mcp_config(config, result);

    result
}

fn validate_llm_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if config.llm.provider.trim().is_empty() {
        result = result.with_error(
            ValidationIssue::new("llm.provider", "no LLM provider configured")
                .with_suggestion("set llm.provider to the identifier your LLMClient expects"),
        );
    }

    if config.llm.model.trim().is_empty() {
        result = result.with_error(
            ValidationIssue::new("llm.model", "no model configured")
                .with_suggestion("set llm.model to a provider-specific model id"),
        );
    }

    result
}

fn validate_agent_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if config.agent.max_steps == 0 {
        result = result.with_error(ValidationIssue::new(
            "agent.max_steps",
            "max_steps must be at least 1 or the loop can never reason",
        ));
    }

    if config.agent.working_directory.trim().is_empty() {
        result = result.with_error(ValidationIssue::new(
            "agent.working_directory",
            "working_directory must not be empty",
        ));
    }

    if config.agent.tools.is_empty() {
        result = result.with_warning(
            ValidationIssue::new(
                "agent.tools",
                "no tools configured; the agent can only produce text responses",
            )
            .with_suggestion("register at least a planner tool and a thinking tool"),
        );
    }

    result
}

fn validate_mcp_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    for server in &config.mcp.servers {
        if server.command.trim().is_empty() {
            result = result.with_error(
                ValidationIssue::new(
                    format!("mcp.servers[{}].command", server.name),
                    "MCP server entry has no launch command",
                )
                .with_suggestion("set command to the executable that speaks MCP over stdio"),
            );
        }
    }

    result
}
