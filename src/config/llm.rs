//! LLM provider configuration — the `llm` section of the factory config.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

fn default_secret() -> SecretString {
    SecretString::from(String::new())
}

/// LLM configuration block of the Agent factory API's config shape.
///
/// The core never dials a provider itself — concrete LLM provider adapters
/// are out of scope. This struct only describes what an `LLMClient`
/// implementation needs to be constructed from, mirroring the teacher's
/// `OpenRouterConfig` shape in `src/config/types/provider.rs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider identifier, e.g. "openrouter", "anthropic", "openai".
    pub provider: String,
    /// Model identifier understood by that provider.
    pub model: String,
    /// API key, if the provider requires one.
    #[serde(skip_serializing, default = "default_secret")]
    pub api_key: SecretString,
    /// Base URL override.
    pub base_url: Option<String>,
    /// Maximum tokens to request per generation.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Top-p sampling.
    pub top_p: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            provider: "openrouter".to_string(),
            model: "anthropic/claude-sonnet-4".to_string(),
            api_key: default_secret(),
            base_url: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
        }
    }
}
