//! Error types for the agent core.

use thiserror::Error;

/// Result type alias using the core's `Error` type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the agent core.
///
/// Tool-specific failures and tool-not-found never surface as `Error`
/// (they're encoded in `ToolResult` instead, see `crate::tools`); the
/// variants here are the ones that can legitimately escape a
/// reasoning/acting suspension point or be raised at construction time.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error, raised at construction time.
    #[error("configuration error: {0}")]
    Config(String),

    /// Error surfaced by an `LLMClient` implementation.
    #[error("LLM client error: {0}")]
    Llm(String),

    /// A tool invocation raised instead of returning a failed `ToolResult`.
    #[error("tool error: {0}")]
    Tool(String),

    /// The operation was interrupted via the Interruption Manager.
    #[error("interrupted: {0}")]
    Interrupted(String),

    /// A step/iteration budget was exhausted.
    #[error("budget exhausted: {0}")]
    BudgetExhausted(String),

    /// A circuit breaker gate is open and rejected the call immediately.
    #[error("circuit '{0}' is open")]
    CircuitOpen(String),

    /// A `withTimeout`-style wrapper expired before the inner operation did.
    #[error("timeout after {0:?}: {1}")]
    Timeout(std::time::Duration, String),

    /// Invalid input, e.g. malformed tool arguments.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found (plan, task, tool, circuit gate).
    #[error("not found: {0}")]
    NotFound(String),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// JSON (de)serialization error, e.g. trajectory persistence or tool
    /// argument parsing.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error, e.g. flushing a trajectory to its sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Default retry predicate: matches error shapes that look like
    /// transient network/timeout faults by substring on the rendered
    /// message. This is intentionally brittle — a structured error
    /// taxonomy would be preferable, but the source this core is modeled
    /// on never had one.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout(..) => true,
            Error::CircuitOpen(_) => false,
            Error::Llm(msg) | Error::Tool(msg) | Error::Internal(msg) => {
                Self::looks_transient(msg)
            }
            Error::Io(_) => true,
            _ => false,
        }
    }

    /// Exposed crate-wide so the Tool Registry can apply the same
    /// transient-fault heuristic to a failed `ToolResult.error` string,
    /// not just to `Err` variants: tool execution retries too.
    pub(crate) fn looks_transient(msg: &str) -> bool {
        let lower = msg.to_lowercase();
        ["timeout", "timed out", "econnreset", "connection reset", "connection refused"]
            .iter()
            .any(|needle| lower.contains(needle))
    }

    /// Whether this is a configuration-time error that should never occur
    /// at steady state.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_matches_transient_shapes() {
        assert!(Error::Llm("request timed out after 30s".into()).is_retryable());
        assert!(Error::Tool("ECONNRESET".into()).is_retryable());
        assert!(Error::Timeout(std::time::Duration::from_secs(1), "op".into()).is_retryable());
        assert!(!Error::InvalidInput("bad arg".into()).is_retryable());
        assert!(!Error::CircuitOpen("llm".into()).is_retryable());
    }

    #[test]
    fn config_error_is_flagged() {
        assert!(Error::Config("missing planner tool".into()).is_config_error());
        assert!(!Error::Internal("oops".into()).is_config_error());
    }
}
